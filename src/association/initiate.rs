//! xDLMS InitiateRequest / InitiateResponse
//!
//! Carried A-XDR encoded inside the user-information field of AARQ/AARE,
//! glo-ciphered when the association uses security.

use core::fmt;

use nom::{
    IResult, Parser,
    bytes::complete::{tag, take},
    error::{Error, ErrorKind},
    number::complete::{be_u16, u8},
};

/// DLMS version number proposed by the client.
pub const DLMS_VERSION: u8 = 6;

/// Value-association name of logical-name referencing associations.
pub const VAA_NAME_LN: u16 = 0x0007;

pub const INITIATE_REQUEST_TAG: u8 = 0x01;
pub const INITIATE_RESPONSE_TAG: u8 = 0x08;
pub const CONFIRMED_SERVICE_ERROR_TAG: u8 = 0x0E;

/// Conformance block tag ([APPLICATION 31] IMPLICIT BIT STRING, 24 bits).
const CONFORMANCE_TAG: [u8; 2] = [0x5F, 0x1F];

/// xDLMS conformance block, the 24 service bits negotiated at association.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Conformance {
    bits: u32,
}

impl Conformance {
    pub const PRIORITY_MGMT_SUPPORTED: Self = Self { bits: 0x004000 };
    pub const ATTRIBUTE_0_SUPPORTED_WITH_GET: Self = Self { bits: 0x002000 };
    pub const BLOCK_TRANSFER_WITH_GET_OR_READ: Self = Self { bits: 0x001000 };
    pub const BLOCK_TRANSFER_WITH_SET_OR_WRITE: Self = Self { bits: 0x000800 };
    pub const BLOCK_TRANSFER_WITH_ACTION: Self = Self { bits: 0x000400 };
    pub const MULTIPLE_REFERENCES: Self = Self { bits: 0x000200 };
    pub const GET: Self = Self { bits: 0x000010 };
    pub const SET: Self = Self { bits: 0x000008 };
    pub const SELECTIVE_ACCESS: Self = Self { bits: 0x000004 };
    pub const EVENT_NOTIFICATION: Self = Self { bits: 0x000002 };
    pub const ACTION: Self = Self { bits: 0x000001 };

    /// Services a logical-name client proposes (`00 7E 1F`).
    pub const LN_CLIENT: Self = Self { bits: 0x007E1F };

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self { bits: (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32 }
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [(self.bits >> 16) as u8, (self.bits >> 8) as u8, self.bits as u8]
    }

    pub const fn bits(&self) -> u32 {
        self.bits
    }

    pub const fn contains(self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }
}

impl fmt::Debug for Conformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Conformance(0x{:06X})", self.bits)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitiateRequest {
    pub dedicated_key: Option<Vec<u8>>,
    pub proposed_conformance: Conformance,
    pub client_max_receive_pdu_size: u16,
}

impl InitiateRequest {
    pub fn new_ln(max_pdu_size: u16) -> Self {
        Self {
            dedicated_key: None,
            proposed_conformance: Conformance::LN_CLIENT,
            client_max_receive_pdu_size: max_pdu_size,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![INITIATE_REQUEST_TAG];

        match self.dedicated_key {
            Some(ref key) => {
                buf.push(0x01);
                buf.push(key.len() as u8);
                buf.extend_from_slice(key);
            }
            None => buf.push(0x00),
        }

        // response-allowed: DEFAULT TRUE, encoded as "use default"
        buf.push(0x00);
        // proposed-quality-of-service: absent
        buf.push(0x00);
        buf.push(DLMS_VERSION);

        buf.extend_from_slice(&CONFORMANCE_TAG);
        buf.extend_from_slice(&[0x04, 0x00]);
        buf.extend_from_slice(&self.proposed_conformance.to_bytes());

        buf.extend_from_slice(&self.client_max_receive_pdu_size.to_be_bytes());
        buf
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitiateResponse {
    pub negotiated_quality_of_service: Option<u8>,
    pub negotiated_dlms_version_number: u8,
    pub negotiated_conformance: Conformance,
    pub server_max_receive_pdu_size: u16,
    pub vaa_name: u16,
}

impl InitiateResponse {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = tag(&[INITIATE_RESPONSE_TAG][..]).parse(input)?;

        let (input, qos_present) = u8(input)?;
        let (input, negotiated_quality_of_service) = if qos_present != 0 {
            let (input, qos) = u8(input)?;
            (input, Some(qos))
        } else {
            (input, None)
        };

        let (input, negotiated_dlms_version_number) = u8(input)?;

        let (input, _) = tag(&CONFORMANCE_TAG[..]).parse(input)?;
        let (input, (_len, _unused_bits, conf)) = (u8, u8, take(3usize)).parse(input)?;
        let negotiated_conformance = Conformance::from_bytes([conf[0], conf[1], conf[2]]);

        let (input, (server_max_receive_pdu_size, vaa_name)) = (be_u16, be_u16).parse(input)?;

        Ok((
            input,
            Self {
                negotiated_quality_of_service,
                negotiated_dlms_version_number,
                negotiated_conformance,
                server_max_receive_pdu_size,
                vaa_name,
            },
        ))
    }
}

/// Parses a ConfirmedServiceError sent instead of an InitiateResponse and
/// returns `(service, error class, error code)`.
pub fn parse_confirmed_service_error(input: &[u8]) -> IResult<&[u8], (u8, u8, u8)> {
    let (input, _) = tag(&[CONFIRMED_SERVICE_ERROR_TAG][..]).parse(input)?;
    let (input, triple) = (u8, u8, u8).parse(input)?;
    if input.len() > 16 {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Eof)));
    }
    Ok((input, triple))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_initiate_request() {
        let request = InitiateRequest::new_ln(0xFFFF);

        #[rustfmt::skip]
        assert_eq!(request.encode(), [
            0x01,                   // initiate-request
            0x00,                   // no dedicated key
            0x00,                   // response-allowed default
            0x00,                   // no quality of service
            0x06,                   // DLMS version 6
            0x5F, 0x1F, 0x04, 0x00, // conformance tag, length, unused bits
            0x00, 0x7E, 0x1F,       // conformance
            0xFF, 0xFF,             // max receive PDU size
        ]);
    }

    #[test]
    fn test_encode_with_dedicated_key() {
        let request = InitiateRequest { dedicated_key: Some(vec![0xAA; 16]), ..InitiateRequest::new_ln(512) };
        let encoded = request.encode();
        assert_eq!(&encoded[..3], &[0x01, 0x01, 0x10]);
        assert_eq!(encoded.len(), 14 + 17);
    }

    #[test]
    fn test_parse_initiate_response() {
        #[rustfmt::skip]
        let input = [
            0x08, 0x00, 0x06,
            0x5F, 0x1F, 0x04, 0x00, 0x00, 0x50, 0x1F,
            0x01, 0xF4,
            0x00, 0x07,
        ];
        let (rest, response) = InitiateResponse::parse(&input).unwrap();

        assert!(rest.is_empty());
        assert_eq!(response.negotiated_quality_of_service, None);
        assert_eq!(response.negotiated_dlms_version_number, 6);
        assert!(response.negotiated_conformance.contains(Conformance::GET));
        assert!(response.negotiated_conformance.contains(Conformance::BLOCK_TRANSFER_WITH_GET_OR_READ));
        assert!(!response.negotiated_conformance.contains(Conformance::MULTIPLE_REFERENCES));
        assert_eq!(response.server_max_receive_pdu_size, 500);
        assert_eq!(response.vaa_name, VAA_NAME_LN);
    }

    #[test]
    fn test_parse_confirmed_service_error() {
        let (_, (service, class, code)) = parse_confirmed_service_error(&[0x0E, 0x01, 0x06, 0x02]).unwrap();
        assert_eq!((service, class, code), (1, 6, 2));
    }

    #[test]
    fn test_conformance_bytes() {
        assert_eq!(Conformance::LN_CLIENT.to_bytes(), [0x00, 0x7E, 0x1F]);
        assert_eq!(Conformance::from_bytes([0x00, 0x7E, 0x1F]), Conformance::LN_CLIENT);
        assert!(Conformance::LN_CLIENT.contains(Conformance::SELECTIVE_ACCESS));
    }
}
