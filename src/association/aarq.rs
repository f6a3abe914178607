//! AARQ APDU (A-Associate Request)
//!
//! Sent by the client to open an application association. The user
//! information field carries an already encoded (and possibly glo-ciphered)
//! xDLMS InitiateRequest.

use super::ber::{TagType, encode_context_specific, encode_object_identifier, encode_octet_string, encode_tlv};
use super::{AARQ_TAG, ApplicationContextName, MechanismName};

/// Sender ACSE requirements with the authentication functional unit set
/// (BIT STRING, 7 unused bits).
const ACSE_REQUIREMENTS_AUTHENTICATION: [u8; 2] = [0x07, 0x80];

#[derive(Debug, Clone, PartialEq)]
pub struct AarqApdu {
    pub application_context_name: ApplicationContextName,
    /// Client system title, sent when ciphering is in use.
    pub calling_ap_title: Option<[u8; 8]>,
    pub mechanism_name: Option<MechanismName>,
    /// Password (LLS) or client challenge (HLS).
    pub calling_authentication_value: Option<Vec<u8>>,
    pub user_information: Vec<u8>,
}

impl AarqApdu {
    pub fn new(application_context_name: ApplicationContextName, user_information: Vec<u8>) -> Self {
        Self {
            application_context_name,
            calling_ap_title: None,
            mechanism_name: None,
            calling_authentication_value: None,
            user_information,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut content = Vec::new();

        // A1: application-context-name
        let context_oid = encode_object_identifier(self.application_context_name.oid_bytes());
        encode_context_specific(&mut content, 1, TagType::Constructed, &context_oid);

        // A6: calling-AP-title
        if let Some(ref title) = self.calling_ap_title {
            encode_context_specific(&mut content, 6, TagType::Constructed, &encode_octet_string(title));
        }

        if let Some(ref mechanism) = self.mechanism_name {
            // 8A: sender-acse-requirements
            encode_context_specific(&mut content, 10, TagType::Primitive, &ACSE_REQUIREMENTS_AUTHENTICATION);
            // 8B: mechanism-name, IMPLICIT OBJECT IDENTIFIER
            encode_context_specific(&mut content, 11, TagType::Primitive, mechanism.oid_bytes());
        }

        // AC: calling-authentication-value, charstring [0] IMPLICIT
        if let Some(ref value) = self.calling_authentication_value {
            let mut auth = Vec::with_capacity(value.len() + 2);
            encode_context_specific(&mut auth, 0, TagType::Primitive, value);
            encode_context_specific(&mut content, 12, TagType::Constructed, &auth);
        }

        // BE: user-information, OCTET STRING wrapping the xDLMS APDU
        encode_context_specific(&mut content, 30, TagType::Constructed, &encode_octet_string(&self.user_information));

        let mut buf = Vec::with_capacity(content.len() + 3);
        encode_tlv(&mut buf, AARQ_TAG, &content);
        buf
    }
}
