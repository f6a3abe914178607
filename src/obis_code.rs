use core::fmt::{self, Debug, Display};
use core::str::FromStr;

use nom::{IResult, Parser, number::complete::u8};
#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors produced when parsing a dotted OBIS code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObisError {
    #[error("expected 6 dot-separated groups, found {0}")]
    ComponentCount(usize),

    #[error("group {index} ({value:?}) is not a decimal number")]
    NotANumber { index: usize, value: String },

    #[error("group {index} ({value}) is out of range 0-255")]
    OutOfRange { index: usize, value: u32 },
}

/// An OBIS code.
///
/// The textual form used throughout this crate is the logical-name notation
/// `a.b.c.d.e.f`, six decimal groups in the range 0-255.
///
/// # Examples
///
/// ```
/// use dlms_meter::ObisCode;
///
/// let code: ObisCode = "1.0.99.1.0.255".parse().unwrap();
/// assert_eq!(code.to_bytes(), [1, 0, 99, 1, 0, 255]);
/// assert_eq!(code.to_string(), "1.0.99.1.0.255");
///
/// assert!("1.0.99.1.0".parse::<ObisCode>().is_err());
/// assert!("1.0.99.1.0.256".parse::<ObisCode>().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObisCode {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
}

impl ObisCode {
    pub const fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5])
    }

    pub const fn to_bytes(&self) -> [u8; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Builds an OBIS code from a logical-name octet string, which must be
    /// exactly six bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = bytes.try_into().ok()?;
        Some(Self::from_bytes(bytes))
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (a, b, c, d, e, f)) = (u8, u8, u8, u8, u8, u8).parse(input)?;
        Ok((input, Self::new(a, b, c, d, e, f)))
    }
}

impl FromStr for ObisCode {
    type Err = ObisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups: Vec<&str> = s.split('.').collect();
        if groups.len() != 6 {
            return Err(ObisError::ComponentCount(groups.len()));
        }

        let mut bytes = [0u8; 6];
        for (index, (group, byte)) in groups.iter().zip(bytes.iter_mut()).enumerate() {
            if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ObisError::NotANumber { index, value: (*group).to_owned() });
            }
            // Digit runs too long for u32 saturate; they are out of range either way.
            let value = group.parse::<u32>().unwrap_or(u32::MAX);
            *byte = u8::try_from(value).map_err(|_| ObisError::OutOfRange { index, value })?;
        }

        Ok(Self::from_bytes(bytes))
    }
}

impl TryFrom<&str> for ObisCode {
    type Error = ObisError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Display for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}.{}.{}.{}", self.a, self.b, self.c, self.d, self.e, self.f)
    }
}

impl Debug for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ObisCode({})", self)
    }
}

#[cfg(feature = "serde")]
impl Serialize for ObisCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
