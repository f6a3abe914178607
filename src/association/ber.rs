//! ASN.1 BER (Basic Encoding Rules) helpers
//!
//! The minimal subset of BER needed for AARQ/AARE/RLRQ APDUs: single-byte
//! tags and definite lengths up to 65535 bytes.

use nom::{
    IResult, Parser,
    bytes::complete::take,
    error::{Error, ErrorKind},
    number::complete::u8 as nom_u8,
};

// ============================================================================
// BER Tag Classes and Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Application,
    ContextSpecific,
}

impl TagClass {
    pub const fn to_bits(self) -> u8 {
        match self {
            TagClass::Application => 0b01_000000,
            TagClass::ContextSpecific => 0b10_000000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Primitive,
    Constructed,
}

impl TagType {
    pub const fn to_bit(self) -> u8 {
        match self {
            TagType::Primitive => 0b0000_0000,
            TagType::Constructed => 0b0010_0000,
        }
    }
}

pub const fn encode_tag(class: TagClass, tag_type: TagType, tag_number: u8) -> u8 {
    class.to_bits() | tag_type.to_bit() | (tag_number & 0b000_11111)
}

// ============================================================================
// BER Length Encoding/Parsing (Definite Form Only)
// ============================================================================

pub fn encode_length(buf: &mut Vec<u8>, length: usize) {
    if length <= 127 {
        buf.push(length as u8);
    } else if length <= 255 {
        buf.extend_from_slice(&[0x81, length as u8]);
    } else {
        // APDUs are bounded by the negotiated PDU size, which fits in u16.
        let length = length.min(u16::MAX as usize) as u16;
        buf.push(0x82);
        buf.extend_from_slice(&length.to_be_bytes());
    }
}

pub fn parse_length(input: &[u8]) -> IResult<&[u8], usize> {
    let (input, first_byte) = nom_u8(input)?;

    if first_byte & 0x80 == 0 {
        return Ok((input, first_byte as usize));
    }

    let num_octets = (first_byte & 0x7F) as usize;
    if num_octets == 0 || num_octets > 2 {
        // Indefinite form and lengths above 65535 are not supported
        return Err(nom::Err::Error(Error::new(input, ErrorKind::LengthValue)));
    }

    let (input, bytes) = take(num_octets).parse(input)?;
    let length = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
    Ok((input, length))
}

// ============================================================================
// TLV helpers
// ============================================================================

/// Appends `tag || length || content`.
pub fn encode_tlv(buf: &mut Vec<u8>, tag: u8, content: &[u8]) {
    buf.push(tag);
    encode_length(buf, content.len());
    buf.extend_from_slice(content);
}

pub fn encode_context_specific(buf: &mut Vec<u8>, tag_number: u8, tag_type: TagType, content: &[u8]) {
    encode_tlv(buf, encode_tag(TagClass::ContextSpecific, tag_type, tag_number), content);
}

pub fn encode_object_identifier(oid_bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(oid_bytes.len() + 2);
    encode_tlv(&mut result, 0x06, oid_bytes);
    result
}

pub fn encode_octet_string(octets: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(octets.len() + 3);
    encode_tlv(&mut result, 0x04, octets);
    result
}

/// Parses any single TLV and returns its raw tag byte and content.
pub fn parse_tlv(input: &[u8]) -> IResult<&[u8], (u8, &[u8])> {
    let (input, tag) = nom_u8(input)?;
    if tag & 0b000_11111 == 0b000_11111 {
        // Multi-byte tag not supported
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)));
    }
    let (input, length) = parse_length(input)?;
    let (input, content) = take(length).parse(input)?;
    Ok((input, (tag, content)))
}

/// Parses a TLV that must carry `expected` as its tag.
pub fn parse_tagged(expected: u8) -> impl Fn(&[u8]) -> IResult<&[u8], &[u8]> {
    move |input| {
        let (rest, (tag, content)) = parse_tlv(input)?;
        if tag != expected {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)));
        }
        Ok((rest, content))
    }
}

/// Parses a one-byte universal INTEGER (`02 01 xx`).
pub fn parse_small_integer(input: &[u8]) -> IResult<&[u8], u8> {
    let (rest, content) = parse_tagged(0x02)(input)?;
    match content {
        [value] => Ok((rest, *value)),
        _ => Err(nom::Err::Error(Error::new(input, ErrorKind::LengthValue))),
    }
}
