//! GET service (logical-name referencing)
//!
//! # APDU Tags
//! - GET-Request: 0xC0
//! - GET-Response: 0xC4
//!
//! ```text
//! C0 01 C1 00 03 01 00 01 08 00 FF 02 00
//! │  │  │  └───┘ └───────────────┘ │  └─── no access selection
//! │  │  │  class  instance (OBIS)  └────── attribute
//! │  │  └──────────────────────────────── invoke-id-and-priority
//! │  └─────────────────────────────────── choice: Normal
//! └────────────────────────────────────── tag: GET-Request
//! ```

use core::fmt;

use nom::{
    IResult, Parser,
    bytes::complete::take,
    number::complete::{be_u32, u8},
};

use crate::data::{TypedValue, invalid, parse_length};
use crate::obis_code::ObisCode;

pub const GET_REQUEST_TAG: u8 = 0xC0;
pub const GET_RESPONSE_TAG: u8 = 0xC4;

/// COSEM attribute reference used by GET and SET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub class_id: u16,
    pub instance_id: ObisCode,
    pub attribute_id: i8,
}

impl AttributeDescriptor {
    pub fn new(class_id: u16, instance_id: ObisCode, attribute_id: i8) -> Self {
        Self { class_id, instance_id, attribute_id }
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.class_id.to_be_bytes());
        buf.extend_from_slice(&self.instance_id.to_bytes());
        buf.push(self.attribute_id as u8);
    }
}

/// Selective access descriptor: a selector and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessSelector {
    pub selector: u8,
    pub parameters: TypedValue,
}

impl AccessSelector {
    /// Entry descriptor (selector 2) for profile generic buffers. Entries are
    /// 1-based and inclusive; `to_selected_value = 0` means all columns.
    pub fn by_entry(from_entry: u32, to_entry: u32) -> Self {
        Self {
            selector: 2,
            parameters: TypedValue::Structure(vec![
                TypedValue::DoubleLongUnsigned(from_entry),
                TypedValue::DoubleLongUnsigned(to_entry),
                TypedValue::LongUnsigned(1),
                TypedValue::LongUnsigned(0),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GetRequest {
    Normal { invoke_id: u8, attribute: AttributeDescriptor, access_selection: Option<AccessSelector> },
    NextDataBlock { invoke_id: u8, block_number: u32 },
}

impl GetRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![GET_REQUEST_TAG];

        match self {
            GetRequest::Normal { invoke_id, attribute, access_selection } => {
                buf.push(0x01);
                buf.push(*invoke_id);
                attribute.encode(&mut buf);
                match access_selection {
                    Some(access) => {
                        buf.push(0x01);
                        buf.push(access.selector);
                        access.parameters.encode(&mut buf);
                    }
                    None => buf.push(0x00),
                }
            }
            GetRequest::NextDataBlock { invoke_id, block_number } => {
                buf.push(0x02);
                buf.push(*invoke_id);
                buf.extend_from_slice(&block_number.to_be_bytes());
            }
        }

        buf
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataAccessResult {
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
    LongGetAborted = 15,
    NoLongGetInProgress = 16,
    LongSetAborted = 17,
    NoLongSetInProgress = 18,
    DataBlockNumberInvalid = 19,
    OtherReason = 250,
}

impl DataAccessResult {
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
            15 => Some(Self::LongGetAborted),
            16 => Some(Self::NoLongGetInProgress),
            17 => Some(Self::LongSetAborted),
            18 => Some(Self::NoLongSetInProgress),
            19 => Some(Self::DataBlockNumberInvalid),
            250 => Some(Self::OtherReason),
            _ => None,
        }
    }
}

impl fmt::Display for DataAccessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of a GET: data, or the raw data-access-result code.
#[derive(Debug, Clone, PartialEq)]
pub enum GetDataResult {
    Data(TypedValue),
    DataAccessError(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GetDataBlockResult {
    RawData(Vec<u8>),
    DataAccessError(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GetResponse {
    Normal { invoke_id: u8, result: GetDataResult },
    WithDataBlock { invoke_id: u8, last_block: bool, block_number: u32, result: GetDataBlockResult },
}

impl GetResponse {
    pub fn invoke_id(&self) -> u8 {
        match self {
            GetResponse::Normal { invoke_id, .. } | GetResponse::WithDataBlock { invoke_id, .. } => *invoke_id,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (tag, choice, invoke_id)) = (u8, u8, u8).parse(input)?;
        if tag != GET_RESPONSE_TAG {
            return invalid(input);
        }

        match choice {
            0x01 => {
                let (input, result_choice) = u8(input)?;
                let (input, result) = if result_choice == 0x00 {
                    let (input, data) = TypedValue::parse(input)?;
                    (input, GetDataResult::Data(data))
                } else {
                    let (input, code) = u8(input)?;
                    (input, GetDataResult::DataAccessError(code))
                };
                Ok((input, GetResponse::Normal { invoke_id, result }))
            }
            0x02 => {
                let (input, (last_block, block_number, result_choice)) = (u8, be_u32, u8).parse(input)?;
                let (input, result) = if result_choice == 0x00 {
                    let (input, len) = parse_length(input)?;
                    let (input, raw) = take(len).parse(input)?;
                    (input, GetDataBlockResult::RawData(raw.to_vec()))
                } else {
                    let (input, code) = u8(input)?;
                    (input, GetDataBlockResult::DataAccessError(code))
                };
                Ok((input, GetResponse::WithDataBlock { invoke_id, last_block: last_block != 0, block_number, result }))
            }
            _ => invalid(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_time() -> AttributeDescriptor {
        AttributeDescriptor::new(8, ObisCode::new(0, 0, 1, 0, 0, 255), 2)
    }

    #[test]
    fn test_encode_get_request_normal() {
        let request = GetRequest::Normal { invoke_id: 0xC1, attribute: clock_time(), access_selection: None };

        #[rustfmt::skip]
        assert_eq!(request.encode(), [
            0xC0, 0x01, 0xC1,
            0x00, 0x08,
            0x00, 0x00, 0x01, 0x00, 0x00, 0xFF,
            0x02,
            0x00,
        ]);
    }

    #[test]
    fn test_encode_get_request_by_entry() {
        let request = GetRequest::Normal {
            invoke_id: 0xC1,
            attribute: AttributeDescriptor::new(7, ObisCode::new(1, 0, 99, 1, 0, 255), 2),
            access_selection: Some(AccessSelector::by_entry(1, 10)),
        };

        #[rustfmt::skip]
        assert_eq!(request.encode(), [
            0xC0, 0x01, 0xC1,
            0x00, 0x07,
            0x01, 0x00, 0x63, 0x01, 0x00, 0xFF,
            0x02,
            0x01, 0x02,
            0x02, 0x04,
            0x06, 0x00, 0x00, 0x00, 0x01,
            0x06, 0x00, 0x00, 0x00, 0x0A,
            0x12, 0x00, 0x01,
            0x12, 0x00, 0x00,
        ]);
    }

    #[test]
    fn test_encode_next_data_block() {
        let request = GetRequest::NextDataBlock { invoke_id: 0xC1, block_number: 2 };
        assert_eq!(request.encode(), [0xC0, 0x02, 0xC1, 0x00, 0x00, 0x00, 0x02]);
    }

    #[test]
    fn test_parse_response_data() {
        let input = [0xC4, 0x01, 0xC1, 0x00, 0x06, 0x00, 0x00, 0x01, 0x00];
        let (rest, response) = GetResponse::parse(&input).unwrap();

        assert!(rest.is_empty());
        assert_eq!(
            response,
            GetResponse::Normal { invoke_id: 0xC1, result: GetDataResult::Data(TypedValue::DoubleLongUnsigned(256)) }
        );
    }

    #[test]
    fn test_parse_response_error() {
        let (_, response) = GetResponse::parse(&[0xC4, 0x01, 0xC1, 0x01, 0x04]).unwrap();
        assert_eq!(response, GetResponse::Normal { invoke_id: 0xC1, result: GetDataResult::DataAccessError(4) });
        assert_eq!(DataAccessResult::from_u8(4), Some(DataAccessResult::ObjectUndefined));
    }

    #[test]
    fn test_parse_response_data_block() {
        #[rustfmt::skip]
        let input = [
            0xC4, 0x02, 0xC1,
            0x00,
            0x00, 0x00, 0x00, 0x01,
            0x00,
            0x03, 0x01, 0x02, 0x03,
        ];
        let (rest, response) = GetResponse::parse(&input).unwrap();

        assert!(rest.is_empty());
        assert_eq!(
            response,
            GetResponse::WithDataBlock {
                invoke_id: 0xC1,
                last_block: false,
                block_number: 1,
                result: GetDataBlockResult::RawData(vec![1, 2, 3]),
            }
        );
    }

    #[test]
    fn test_parse_wrong_tag() {
        assert!(GetResponse::parse(&[0xC5, 0x01, 0xC1, 0x00]).is_err());
        assert!(GetResponse::parse(&[0xC4, 0x03, 0xC1, 0x00]).is_err());
    }
}
