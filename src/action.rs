//! ACTION service (logical-name referencing)
//!
//! # APDU Tags
//! - ACTION-Request: 0xC3
//! - ACTION-Response: 0xC7

use core::fmt;

use nom::{IResult, Parser, number::complete::u8};

use crate::data::{TypedValue, invalid};
use crate::obis_code::ObisCode;

pub const ACTION_REQUEST_TAG: u8 = 0xC3;
pub const ACTION_RESPONSE_TAG: u8 = 0xC7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub class_id: u16,
    pub instance_id: ObisCode,
    pub method_id: i8,
}

impl MethodDescriptor {
    pub fn new(class_id: u16, instance_id: ObisCode, method_id: i8) -> Self {
        Self { class_id, instance_id, method_id }
    }
}

/// ACTION-Request-Normal
///
/// ```text
/// C3 01 C1 00 08 00 00 01 00 00 FF 07 01 09 0C ...
/// │  │  │  └───┘ └───────────────┘ │  │  └─── parameters (A-XDR data)
/// │  │  │  class  instance (OBIS)  │  └────── parameters present
/// │  │  │                          └───────── method
/// │  │  └──────────────────────────────────── invoke-id-and-priority
/// │  └─────────────────────────────────────── choice: Normal
/// └────────────────────────────────────────── tag: ACTION-Request
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequestNormal {
    pub invoke_id: u8,
    pub method: MethodDescriptor,
    pub parameters: Option<TypedValue>,
}

impl ActionRequestNormal {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![ACTION_REQUEST_TAG, 0x01, self.invoke_id];
        buf.extend_from_slice(&self.method.class_id.to_be_bytes());
        buf.extend_from_slice(&self.method.instance_id.to_bytes());
        buf.push(self.method.method_id as u8);

        match self.parameters {
            Some(ref parameters) => {
                buf.push(0x01);
                parameters.encode(&mut buf);
            }
            None => buf.push(0x00),
        }

        buf
    }
}

/// Action-Result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActionResult {
    Success = 0,
    HardwareFault = 1,
    TemporaryFailure = 2,
    ReadWriteDenied = 3,
    ObjectUndefined = 4,
    ObjectClassInconsistent = 9,
    ObjectUnavailable = 11,
    TypeUnmatched = 12,
    ScopeOfAccessViolated = 13,
    DataBlockUnavailable = 14,
    LongActionAborted = 15,
    NoLongActionInProgress = 16,
    OtherReason = 250,
}

impl ActionResult {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::HardwareFault),
            2 => Some(Self::TemporaryFailure),
            3 => Some(Self::ReadWriteDenied),
            4 => Some(Self::ObjectUndefined),
            9 => Some(Self::ObjectClassInconsistent),
            11 => Some(Self::ObjectUnavailable),
            12 => Some(Self::TypeUnmatched),
            13 => Some(Self::ScopeOfAccessViolated),
            14 => Some(Self::DataBlockUnavailable),
            15 => Some(Self::LongActionAborted),
            16 => Some(Self::NoLongActionInProgress),
            250 => Some(Self::OtherReason),
            _ => None,
        }
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// ACTION-Response-Normal: the raw action-result and the optional return
/// parameters (`Ok` data or a data-access-result code).
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponseNormal {
    pub invoke_id: u8,
    pub result: u8,
    pub return_parameters: Option<Result<TypedValue, u8>>,
}

impl ActionResponseNormal {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (tag, choice, invoke_id, result)) = (u8, u8, u8, u8).parse(input)?;
        if tag != ACTION_RESPONSE_TAG || choice != 0x01 {
            return invalid(input);
        }

        // Some meters end the APDU right after the result.
        if input.is_empty() {
            return Ok((input, Self { invoke_id, result, return_parameters: None }));
        }

        let (input, present) = u8(input)?;
        let (input, return_parameters) = match present {
            0x00 => (input, None),
            _ => match u8(input)? {
                (input, 0x00) => {
                    let (input, data) = TypedValue::parse(input)?;
                    (input, Some(Ok(data)))
                }
                (input, _) => {
                    let (input, code) = u8(input)?;
                    (input, Some(Err(code)))
                }
            },
        };

        Ok((input, Self { invoke_id, result, return_parameters }))
    }
}
