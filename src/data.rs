//! COSEM typed data (A-XDR).
//!
//! [`TypedValue`] is the self-describing value carried in GET/SET/ACTION
//! payloads. It is used both for values read from a meter and for values
//! supplied for writes and method parameters.

use core::convert::TryFrom;
use core::fmt;

use chrono::{Datelike, Timelike};
use nom::{
    IResult, Parser,
    bytes::complete::take,
    error::{Error, ErrorKind},
    multi::count,
    number::complete::{be_f32, be_f64, be_i16, be_i32, be_i64, be_u16, be_u32, be_u64, i8, u8},
};
#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
#[rustfmt::skip]
pub enum DataType {
  Null               =  0,
  Array              =  1,
  Structure          =  2,
  Bool               =  3,
  BitString          =  4,
  DoubleLong         =  5,
  DoubleLongUnsigned =  6,
  OctetString        =  9,
  VisibleString      = 10,
  Utf8String         = 12,
  BinaryCodedDecimal = 13,
  Integer            = 15,
  Long               = 16,
  Unsigned           = 17,
  LongUnsigned       = 18,
  CompactArray       = 19,
  Long64             = 20,
  Long64Unsigned     = 21,
  Enum               = 22,
  Float32            = 23,
  Float64            = 24,
  DateTime           = 25,
  Date               = 26,
  Time               = 27,
}

impl TryFrom<u8> for DataType {
    type Error = u8;

    fn try_from(dt: u8) -> Result<Self, Self::Error> {
        Ok(match dt {
            0x00 => Self::Null,
            0x01 => Self::Array,
            0x02 => Self::Structure,
            0x03 => Self::Bool,
            0x04 => Self::BitString,
            0x05 => Self::DoubleLong,
            0x06 => Self::DoubleLongUnsigned,
            0x09 => Self::OctetString,
            0x0a => Self::VisibleString,
            0x0c => Self::Utf8String,
            0x0d => Self::BinaryCodedDecimal,
            0x0f => Self::Integer,
            0x10 => Self::Long,
            0x11 => Self::Unsigned,
            0x12 => Self::LongUnsigned,
            0x13 => Self::CompactArray,
            0x14 => Self::Long64,
            0x15 => Self::Long64Unsigned,
            0x16 => Self::Enum,
            0x17 => Self::Float32,
            0x18 => Self::Float64,
            0x19 => Self::DateTime,
            0x1a => Self::Date,
            0x1b => Self::Time,
            dt => return Err(dt),
        })
    }
}

pub(crate) fn invalid<T>(input: &[u8]) -> IResult<&[u8], T> {
    Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)))
}

/// Deepest array/structure nesting accepted from a meter.
pub const MAX_NESTING_DEPTH: usize = 64;

fn check_depth(input: &[u8], depth: usize) -> IResult<&[u8], ()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }
    Ok((input, ()))
}

// ============================================================================
// A-XDR length
// ============================================================================

/// Parses an A-XDR variable-length quantity (short form below 0x80, otherwise
/// `0x80 | n` followed by `n` big-endian length bytes).
pub(crate) fn parse_length(input: &[u8]) -> IResult<&[u8], usize> {
    let (input, first) = u8(input)?;
    if first & 0x80 == 0 {
        return Ok((input, first as usize));
    }

    let octets = (first & 0x7F) as usize;
    if octets == 0 || octets > 4 {
        return invalid(input);
    }
    let (input, bytes) = take(octets).parse(input)?;
    let length = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
    Ok((input, length))
}

pub(crate) fn encode_length(buf: &mut Vec<u8>, length: usize) {
    if length < 0x80 {
        buf.push(length as u8);
    } else if length <= 0xFF {
        buf.extend_from_slice(&[0x81, length as u8]);
    } else if length <= 0xFFFF {
        buf.push(0x82);
        buf.extend_from_slice(&(length as u16).to_be_bytes());
    } else {
        buf.push(0x84);
        buf.extend_from_slice(&(length as u32).to_be_bytes());
    }
}

// ============================================================================
// Date / Time / DateTime
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day_of_month: u8,
    pub day_of_week: u8,
}

impl Date {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (year, month, day_of_month, day_of_week)) =
            (be_u16, u8, u8, u8).parse(input)?;

        // 0xFD/0xFE are "second to last"/"last" day or DST markers, 0xFF is unspecified.
        if !matches!(month, 1..=12 | 0xFD..=0xFF)
            || !matches!(day_of_month, 1..=31 | 0xFD..=0xFF)
            || !matches!(day_of_week, 1..=7 | 0xFF)
        {
            return invalid(input);
        }

        Ok((input, Self { year, month, day_of_month, day_of_week }))
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.year.to_be_bytes());
        buf.extend_from_slice(&[self.month, self.day_of_month, self.day_of_week]);
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day_of_month)
    }
}

impl fmt::Debug for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Date(\"{}\")", self)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Time {
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub hundredth: Option<u8>,
}

impl Time {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (hour, minute, second, hundredth)) = (u8, u8, u8, u8).parse(input)?;

        let hour = match hour {
            0xff => None,
            0..=23 => Some(hour),
            _ => return invalid(input),
        };
        let minute = match minute {
            0xff => None,
            0..=59 => Some(minute),
            _ => return invalid(input),
        };
        let second = match second {
            0xff => None,
            0..=59 => Some(second),
            _ => return invalid(input),
        };
        let hundredth = match hundredth {
            0xff => None,
            0..=99 => Some(hundredth),
            _ => return invalid(input),
        };

        Ok((input, Self { hour, minute, second, hundredth }))
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        for field in [self.hour, self.minute, self.second, self.hundredth] {
            buf.push(field.unwrap_or(0xFF));
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hour.unwrap_or(0),
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
        )?;
        if let Some(hundredth) = self.hundredth {
            write!(f, ".{:02}", hundredth)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Time(\"{}\")", self)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Time {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockStatus(pub u8);

impl ClockStatus {
    #[rustfmt::skip]
    const INVALID_VALUE_BIT:   u8 = 0b00000001;
    #[rustfmt::skip]
    const DOUBTFUL_VALUE_BIT:  u8 = 0b00000010;
    #[rustfmt::skip]
    const DIFFERENT_BASE_BIT:  u8 = 0b00000100;
    #[rustfmt::skip]
    const INVALID_STATUS_BIT:  u8 = 0b00001000;
    #[rustfmt::skip]
    const DAYLIGHT_SAVING_BIT: u8 = 0b10000000;

    pub fn invalid_value(&self) -> bool {
        (self.0 & Self::INVALID_VALUE_BIT) != 0
    }

    pub fn doubtful_value(&self) -> bool {
        (self.0 & Self::DOUBTFUL_VALUE_BIT) != 0
    }

    pub fn different_base(&self) -> bool {
        (self.0 & Self::DIFFERENT_BASE_BIT) != 0
    }

    pub fn invalid_status(&self) -> bool {
        (self.0 & Self::INVALID_STATUS_BIT) != 0
    }

    pub fn daylight_saving(&self) -> bool {
        (self.0 & Self::DAYLIGHT_SAVING_BIT) != 0
    }
}

/// COSEM date-time: twelve octets of date, time, deviation and clock status.
#[derive(Clone, PartialEq, Eq)]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
    /// Minutes of UTC relative to local time; `None` when unspecified (0x8000).
    pub deviation: Option<i16>,
    pub clock_status: Option<ClockStatus>,
}

impl DateTime {
    pub const ENCODED_LEN: usize = 12;

    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, date) = Date::parse(input)?;
        let (input, time) = Time::parse(input)?;
        let (input, deviation) = be_i16(input)?;
        let deviation = Some(deviation).filter(|&d| d != i16::MIN);
        let (input, clock_status) = u8(input)?;
        let clock_status = Some(clock_status).filter(|&b| b != 0xff).map(ClockStatus);

        Ok((input, Self { date, time, deviation, clock_status }))
    }

    /// Interprets exactly twelve octets as a date-time; malformed fields yield `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::ENCODED_LEN {
            return None;
        }
        Self::parse(bytes).ok().map(|(_, date_time)| date_time)
    }

    /// Builds a UTC date-time (deviation 0, clock status OK) from a Unix timestamp.
    pub fn from_unix(timestamp: i64) -> Option<Self> {
        let utc = chrono::DateTime::from_timestamp(timestamp, 0)?;
        let year = u16::try_from(utc.year()).ok()?;

        Some(Self {
            date: Date {
                year,
                month: utc.month() as u8,
                day_of_month: utc.day() as u8,
                day_of_week: utc.weekday().number_from_monday() as u8,
            },
            time: Time {
                hour: Some(utc.hour() as u8),
                minute: Some(utc.minute() as u8),
                second: Some(utc.second() as u8),
                hundredth: Some(0),
            },
            deviation: Some(0),
            clock_status: Some(ClockStatus(0)),
        })
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        self.date.encode(buf);
        self.time.encode(buf);
        buf.extend_from_slice(&self.deviation.unwrap_or(i16::MIN).to_be_bytes());
        buf.push(self.clock_status.map_or(0xFF, |status| status.0));
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        self.encode(&mut buf);
        buf
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date, self.time)?;

        match self.deviation {
            None => {}
            Some(0) => 'Z'.fmt(f)?,
            Some(deviation) => {
                let sign = if deviation > 0 { '-' } else { '+' };
                let minutes = deviation.unsigned_abs();
                write!(f, "{}{:02}:{:02}", sign, minutes / 60, minutes % 60)?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DateTime(\"{}\")", self)
    }
}

#[cfg(feature = "serde")]
impl Serialize for DateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

// ============================================================================
// TypedValue
// ============================================================================

/// A typed COSEM value.
///
/// Strings keep their raw bytes: meters are an untrusted source and a
/// visible-string is not guaranteed to be valid UTF-8. Date and time values
/// whose octets do not form a valid timestamp decode to `None` rather than
/// failing the whole reply.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TypedValue {
    Null,
    Array(Vec<TypedValue>),
    Structure(Vec<TypedValue>),
    Boolean(bool),
    BitString { bits: usize, bytes: Vec<u8> },
    DoubleLong(i32),
    DoubleLongUnsigned(u32),
    OctetString(Vec<u8>),
    VisibleString(Vec<u8>),
    Utf8String(Vec<u8>),
    Bcd(u8),
    Integer(i8),
    Long(i16),
    Unsigned(u8),
    LongUnsigned(u16),
    /// Compact array, kept as its undecoded contents.
    CompactArray(Vec<u8>),
    Long64(i64),
    Long64Unsigned(u64),
    Enum(u8),
    Float32(f32),
    Float64(f64),
    DateTime(Option<DateTime>),
    Date(Option<Date>),
    Time(Option<Time>),
}

impl TypedValue {
    pub fn data_type(&self) -> DataType {
        match self {
            TypedValue::Null => DataType::Null,
            TypedValue::Array(_) => DataType::Array,
            TypedValue::Structure(_) => DataType::Structure,
            TypedValue::Boolean(_) => DataType::Bool,
            TypedValue::BitString { .. } => DataType::BitString,
            TypedValue::DoubleLong(_) => DataType::DoubleLong,
            TypedValue::DoubleLongUnsigned(_) => DataType::DoubleLongUnsigned,
            TypedValue::OctetString(_) => DataType::OctetString,
            TypedValue::VisibleString(_) => DataType::VisibleString,
            TypedValue::Utf8String(_) => DataType::Utf8String,
            TypedValue::Bcd(_) => DataType::BinaryCodedDecimal,
            TypedValue::Integer(_) => DataType::Integer,
            TypedValue::Long(_) => DataType::Long,
            TypedValue::Unsigned(_) => DataType::Unsigned,
            TypedValue::LongUnsigned(_) => DataType::LongUnsigned,
            TypedValue::CompactArray(_) => DataType::CompactArray,
            TypedValue::Long64(_) => DataType::Long64,
            TypedValue::Long64Unsigned(_) => DataType::Long64Unsigned,
            TypedValue::Enum(_) => DataType::Enum,
            TypedValue::Float32(_) => DataType::Float32,
            TypedValue::Float64(_) => DataType::Float64,
            TypedValue::DateTime(_) => DataType::DateTime,
            TypedValue::Date(_) => DataType::Date,
            TypedValue::Time(_) => DataType::Time,
        }
    }

    /// The on-wire type tag.
    pub fn tag(&self) -> u8 {
        self.data_type() as u8
    }

    /// Widens any integer-like value to `i128`.
    pub fn as_integer(&self) -> Option<i128> {
        Some(match *self {
            TypedValue::Integer(n) => n.into(),
            TypedValue::Long(n) => n.into(),
            TypedValue::DoubleLong(n) => n.into(),
            TypedValue::Long64(n) => n.into(),
            TypedValue::Unsigned(n) | TypedValue::Enum(n) => n.into(),
            TypedValue::LongUnsigned(n) => n.into(),
            TypedValue::DoubleLongUnsigned(n) => n.into(),
            TypedValue::Long64Unsigned(n) => n.into(),
            _ => return None,
        })
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TypedValue::OctetString(bytes)
            | TypedValue::VisibleString(bytes)
            | TypedValue::Utf8String(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_elements(&self) -> Option<&[TypedValue]> {
        match self {
            TypedValue::Array(items) | TypedValue::Structure(items) => Some(items),
            _ => None,
        }
    }

    /// Parses one value. Nesting deeper than [`MAX_NESTING_DEPTH`] fails.
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        Self::parse_nested(input, 0)
    }

    fn parse_nested(input: &[u8], depth: usize) -> IResult<&[u8], Self> {
        let (input, ()) = check_depth(input, depth)?;
        let (input, data_type) = u8(input)?;
        let Ok(data_type) = DataType::try_from(data_type) else {
            return invalid(input);
        };

        Ok(match data_type {
            DataType::Null => (input, TypedValue::Null),
            DataType::Array => {
                let (input, len) = parse_length(input)?;
                let (input, items) = count(|input| Self::parse_nested(input, depth + 1), len).parse(input)?;
                (input, TypedValue::Array(items))
            }
            DataType::Structure => {
                let (input, len) = parse_length(input)?;
                let (input, items) = count(|input| Self::parse_nested(input, depth + 1), len).parse(input)?;
                (input, TypedValue::Structure(items))
            }
            DataType::Bool => {
                let (input, b) = u8(input)?;
                (input, TypedValue::Boolean(b != 0))
            }
            DataType::BitString => {
                let (input, bits) = parse_length(input)?;
                let (input, bytes) = take(bits.div_ceil(8)).parse(input)?;
                (input, TypedValue::BitString { bits, bytes: bytes.to_vec() })
            }
            DataType::DoubleLong => {
                let (input, n) = be_i32(input)?;
                (input, TypedValue::DoubleLong(n))
            }
            DataType::DoubleLongUnsigned => {
                let (input, n) = be_u32(input)?;
                (input, TypedValue::DoubleLongUnsigned(n))
            }
            DataType::OctetString => {
                let (input, bytes) = length_bytes(input)?;
                (input, TypedValue::OctetString(bytes))
            }
            DataType::VisibleString => {
                let (input, bytes) = length_bytes(input)?;
                (input, TypedValue::VisibleString(bytes))
            }
            DataType::Utf8String => {
                let (input, bytes) = length_bytes(input)?;
                (input, TypedValue::Utf8String(bytes))
            }
            DataType::BinaryCodedDecimal => {
                let (input, n) = u8(input)?;
                (input, TypedValue::Bcd(n))
            }
            DataType::Integer => {
                let (input, n) = i8(input)?;
                (input, TypedValue::Integer(n))
            }
            DataType::Long => {
                let (input, n) = be_i16(input)?;
                (input, TypedValue::Long(n))
            }
            DataType::Unsigned => {
                let (input, n) = u8(input)?;
                (input, TypedValue::Unsigned(n))
            }
            DataType::LongUnsigned => {
                let (input, n) = be_u16(input)?;
                (input, TypedValue::LongUnsigned(n))
            }
            DataType::CompactArray => {
                let (input, ()) = skip_type_description(input, depth + 1)?;
                let (input, contents) = length_bytes(input)?;
                (input, TypedValue::CompactArray(contents))
            }
            DataType::Long64 => {
                let (input, n) = be_i64(input)?;
                (input, TypedValue::Long64(n))
            }
            DataType::Long64Unsigned => {
                let (input, n) = be_u64(input)?;
                (input, TypedValue::Long64Unsigned(n))
            }
            DataType::Enum => {
                let (input, n) = u8(input)?;
                (input, TypedValue::Enum(n))
            }
            DataType::Float32 => {
                let (input, n) = be_f32(input)?;
                (input, TypedValue::Float32(n))
            }
            DataType::Float64 => {
                let (input, n) = be_f64(input)?;
                (input, TypedValue::Float64(n))
            }
            DataType::DateTime => {
                let (input, bytes) = take(DateTime::ENCODED_LEN).parse(input)?;
                (input, TypedValue::DateTime(DateTime::from_bytes(bytes)))
            }
            DataType::Date => {
                let (input, bytes) = take(5usize).parse(input)?;
                (input, TypedValue::Date(Date::parse(bytes).ok().map(|(_, date)| date)))
            }
            DataType::Time => {
                let (input, bytes) = take(4usize).parse(input)?;
                (input, TypedValue::Time(Time::parse(bytes).ok().map(|(_, time)| time)))
            }
        })
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.tag());
        match self {
            TypedValue::Null => {}
            TypedValue::Array(items) | TypedValue::Structure(items) => {
                encode_length(buf, items.len());
                for item in items {
                    item.encode(buf);
                }
            }
            TypedValue::Boolean(b) => buf.push(u8::from(*b)),
            TypedValue::BitString { bits, bytes } => {
                encode_length(buf, *bits);
                buf.extend_from_slice(bytes);
            }
            TypedValue::DoubleLong(n) => buf.extend_from_slice(&n.to_be_bytes()),
            TypedValue::DoubleLongUnsigned(n) => buf.extend_from_slice(&n.to_be_bytes()),
            TypedValue::OctetString(bytes)
            | TypedValue::VisibleString(bytes)
            | TypedValue::Utf8String(bytes) => {
                encode_length(buf, bytes.len());
                buf.extend_from_slice(bytes);
            }
            TypedValue::Bcd(n) | TypedValue::Unsigned(n) | TypedValue::Enum(n) => buf.push(*n),
            TypedValue::Integer(n) => buf.extend_from_slice(&n.to_be_bytes()),
            TypedValue::Long(n) => buf.extend_from_slice(&n.to_be_bytes()),
            TypedValue::LongUnsigned(n) => buf.extend_from_slice(&n.to_be_bytes()),
            TypedValue::CompactArray(contents) => {
                // The element type description is not retained; contents go out as unsigned octets.
                buf.push(DataType::Unsigned as u8);
                encode_length(buf, contents.len());
                buf.extend_from_slice(contents);
            }
            TypedValue::Long64(n) => buf.extend_from_slice(&n.to_be_bytes()),
            TypedValue::Long64Unsigned(n) => buf.extend_from_slice(&n.to_be_bytes()),
            TypedValue::Float32(n) => buf.extend_from_slice(&n.to_be_bytes()),
            TypedValue::Float64(n) => buf.extend_from_slice(&n.to_be_bytes()),
            TypedValue::DateTime(date_time) => match date_time {
                Some(date_time) => date_time.encode(buf),
                None => buf.extend_from_slice(&[0xFF; DateTime::ENCODED_LEN]),
            },
            TypedValue::Date(date) => match date {
                Some(date) => date.encode(buf),
                None => buf.extend_from_slice(&[0xFF; 5]),
            },
            TypedValue::Time(time) => match time {
                Some(time) => time.encode(buf),
                None => buf.extend_from_slice(&[0xFF; 4]),
            },
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

fn length_bytes(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let (input, len) = parse_length(input)?;
    let (input, bytes) = take(len).parse(input)?;
    Ok((input, bytes.to_vec()))
}

/// Skips a compact-array type description.
fn skip_type_description(input: &[u8], depth: usize) -> IResult<&[u8], ()> {
    let (input, ()) = check_depth(input, depth)?;
    let (input, tag) = u8(input)?;
    match DataType::try_from(tag) {
        Ok(DataType::Array) => {
            let (input, _elements) = be_u16(input)?;
            skip_type_description(input, depth + 1)
        }
        Ok(DataType::Structure) => {
            let (input, len) = parse_length(input)?;
            let (input, _) = count(|input| skip_type_description(input, depth + 1), len).parse(input)?;
            Ok((input, ()))
        }
        Ok(_) => Ok((input, ())),
        Err(_) => invalid(input),
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for TypedValue {
                fn from(value: $ty) -> Self {
                    TypedValue::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Boolean,
    i8 => Integer,
    i16 => Long,
    i32 => DoubleLong,
    i64 => Long64,
    u8 => Unsigned,
    u16 => LongUnsigned,
    u32 => DoubleLongUnsigned,
    u64 => Long64Unsigned,
    f32 => Float32,
    f64 => Float64,
}

impl From<DateTime> for TypedValue {
    fn from(value: DateTime) -> Self {
        TypedValue::DateTime(Some(value))
    }
}
