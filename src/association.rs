//! Association Layer - ACSE APDUs for DLMS/COSEM
//!
//! The client opens an application association with an AARQ (tag 0x60), the
//! meter accepts or rejects it with an AARE (tag 0x61), and the association
//! is closed with an RLRQ (tag 0x62) answered by an RLRE (tag 0x63).
//!
//! AARQ/AARE use ASN.1 BER with context-specific tags; the xDLMS
//! InitiateRequest/InitiateResponse carried in their user-information field
//! is A-XDR encoded.

pub use self::{
    aare::{AareApdu, ResultSourceDiagnostic},
    aarq::AarqApdu,
    enums::*,
    initiate::{Conformance, InitiateRequest, InitiateResponse},
};

mod aare;
mod aarq;
pub(crate) mod ber;
mod enums;
pub(crate) mod initiate;

use ber::{TagClass, TagType, encode_tag};

pub const AARQ_TAG: u8 = encode_tag(TagClass::Application, TagType::Constructed, 0);
pub const AARE_TAG: u8 = encode_tag(TagClass::Application, TagType::Constructed, 1);
pub const RLRQ_TAG: u8 = encode_tag(TagClass::Application, TagType::Constructed, 2);
pub const RLRE_TAG: u8 = encode_tag(TagClass::Application, TagType::Constructed, 3);

/// Encodes a release request with reason `normal`.
pub fn encode_release_request() -> Vec<u8> {
    vec![RLRQ_TAG, 0x03, 0x80, 0x01, 0x00]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apdu_tags() {
        assert_eq!([AARQ_TAG, AARE_TAG, RLRQ_TAG, RLRE_TAG], [0x60, 0x61, 0x62, 0x63]);
    }

    #[test]
    fn test_release_request() {
        assert_eq!(encode_release_request(), [0x62, 0x03, 0x80, 0x01, 0x00]);
    }

    #[test]
    fn test_aarq_initiate_to_aare() {
        let aarq = AarqApdu::new(
            ApplicationContextName::LogicalNameReferencing,
            InitiateRequest::new_ln(0x0400).encode(),
        )
        .encode();
        assert_eq!(aarq[0], AARQ_TAG);

        #[rustfmt::skip]
        let aare = [
            0x61, 0x29,
            0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01,
            0xA2, 0x03, 0x02, 0x01, 0x00,
            0xA3, 0x05, 0xA1, 0x03, 0x02, 0x01, 0x00,
            0xBE, 0x10, 0x04, 0x0E,
            0x08, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x7E, 0x1F, 0x04, 0x00, 0x00, 0x07,
        ];
        let (_, parsed) = AareApdu::parse(&aare).unwrap();
        let user_information = parsed.user_information.unwrap();
        let (_, initiate) = InitiateResponse::parse(&user_information).unwrap();

        assert_eq!(initiate.negotiated_conformance, Conformance::LN_CLIENT);
        assert_eq!(initiate.server_max_receive_pdu_size, 0x0400);
    }
}
