//! SET service (logical-name referencing)
//!
//! # APDU Tags
//! - SET-Request: 0xC1
//! - SET-Response: 0xC5
//!
//! ```text
//! C1 01 C1 00 01 00 00 60 01 00 FF 02 00 09 03 41 42 43
//! │  │  │  └─────────────────────────┘ │  └─────────── value (A-XDR data)
//! │  │  │        attribute descriptor  └────────────── no access selection
//! │  │  └─────────────────────────────────────────────── invoke-id-and-priority
//! │  └────────────────────────────────────────────────── choice: Normal
//! └───────────────────────────────────────────────────── tag: SET-Request
//! ```

use nom::{IResult, Parser, number::complete::u8};

use crate::data::{TypedValue, invalid};
use crate::get::AttributeDescriptor;

pub const SET_REQUEST_TAG: u8 = 0xC1;
pub const SET_RESPONSE_TAG: u8 = 0xC5;

#[derive(Debug, Clone, PartialEq)]
pub struct SetRequestNormal {
    pub invoke_id: u8,
    pub attribute: AttributeDescriptor,
    pub value: TypedValue,
}

impl SetRequestNormal {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![SET_REQUEST_TAG, 0x01, self.invoke_id];
        self.attribute.encode(&mut buf);
        // access-selection: absent
        buf.push(0x00);
        self.value.encode(&mut buf);
        buf
    }
}

/// SET-Response-Normal carrying a data-access-result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetResponseNormal {
    pub invoke_id: u8,
    pub result: u8,
}

impl SetResponseNormal {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (tag, choice, invoke_id, result)) = (u8, u8, u8, u8).parse(input)?;
        if tag != SET_RESPONSE_TAG || choice != 0x01 {
            return invalid(input);
        }
        Ok((input, Self { invoke_id, result }))
    }
}
