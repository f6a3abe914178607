//! IEC 62056-47 wrapper framing for DLMS/COSEM over TCP.
//!
//! Every APDU is preceded by an 8-byte header: protocol version (always
//! `0x0001`), source wPort, destination wPort and the APDU length, all
//! big-endian `u16`.

use nom::{
    IResult, Parser,
    bytes::complete::tag,
    number::complete::be_u16,
};

pub const WRAPPER_VERSION: u16 = 0x0001;
pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapperHeader {
    pub source: u16,
    pub destination: u16,
    pub length: u16,
}

impl WrapperHeader {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = tag(&WRAPPER_VERSION.to_be_bytes()[..]).parse(input)?;
        let (input, (source, destination, length)) = (be_u16, be_u16, be_u16).parse(input)?;
        Ok((input, Self { source, destination, length }))
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&WRAPPER_VERSION.to_be_bytes());
        buf.extend_from_slice(&self.source.to_be_bytes());
        buf.extend_from_slice(&self.destination.to_be_bytes());
        buf.extend_from_slice(&self.length.to_be_bytes());
    }
}

/// Frames `apdu` from `source` to `destination`.
///
/// Returns `None` if the APDU does not fit the 16-bit length field.
pub fn encode_frame(source: u16, destination: u16, apdu: &[u8]) -> Option<Vec<u8>> {
    let length = u16::try_from(apdu.len()).ok()?;
    let mut frame = Vec::with_capacity(HEADER_LEN + apdu.len());
    WrapperHeader { source, destination, length }.encode(&mut frame);
    frame.extend_from_slice(apdu);
    Some(frame)
}

/// Splits one complete frame off the front of `input`.
///
/// `Ok(None)` means more bytes are needed; an error means the header is not
/// a wrapper header.
pub fn split_frame(input: &[u8]) -> Result<Option<(WrapperHeader, &[u8])>, nom::Err<nom::error::Error<&[u8]>>> {
    if input.len() < HEADER_LEN {
        return Ok(None);
    }
    let (rest, header) = WrapperHeader::parse(input)?;
    let length = header.length as usize;
    if rest.len() < length {
        return Ok(None);
    }
    Ok(Some((header, &rest[..length])))
}
