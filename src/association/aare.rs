//! AARE APDU (A-Associate Response)
//!
//! Parsed from the server's answer to an AARQ. Only the fields the client
//! acts on are kept; other ACSE fields are skipped.

use core::fmt;

use nom::{
    IResult,
    error::{Error, ErrorKind},
};

use super::ber::{parse_small_integer, parse_tagged, parse_tlv};
use super::{AARE_TAG, AcseServiceUserDiagnostics, ApplicationContextName, AssociationResult};

/// Source and value of the `result-source-diagnostic` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSourceDiagnostic {
    ServiceUser(u8),
    ServiceProvider(u8),
}

impl ResultSourceDiagnostic {
    pub fn user(&self) -> Option<AcseServiceUserDiagnostics> {
        match *self {
            Self::ServiceUser(value) => AcseServiceUserDiagnostics::from_u8(value),
            Self::ServiceProvider(_) => None,
        }
    }
}

impl fmt::Display for ResultSourceDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.user()) {
            (_, Some(user)) => write!(f, "{}", user),
            (Self::ServiceUser(value), None) => write!(f, "service user diagnostic {}", value),
            (Self::ServiceProvider(value), _) => write!(f, "service provider diagnostic {}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AareApdu {
    pub application_context_name: Option<ApplicationContextName>,
    pub result: AssociationResult,
    pub result_source_diagnostic: ResultSourceDiagnostic,
    /// Server system title.
    pub responding_ap_title: Option<Vec<u8>>,
    /// Server challenge (StoC) for HLS.
    pub responding_authentication_value: Option<Vec<u8>>,
    /// Raw xDLMS APDU from the user-information field.
    pub user_information: Option<Vec<u8>>,
}

impl AareApdu {
    /// Whether the server expects HLS pass 3 before the association is usable.
    pub fn requires_authentication(&self) -> bool {
        self.result_source_diagnostic.user() == Some(AcseServiceUserDiagnostics::AuthenticationRequired)
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (rest, mut content) = parse_tagged(AARE_TAG)(input)?;

        let mut application_context_name = None;
        let mut result = None;
        let mut result_source_diagnostic = ResultSourceDiagnostic::ServiceUser(0);
        let mut responding_ap_title = None;
        let mut responding_authentication_value = None;
        let mut user_information = None;

        while !content.is_empty() {
            let (next, (tag, value)) = parse_tlv(content)?;
            match tag {
                // A1: application-context-name
                0xA1 => {
                    let (_, oid) = parse_tagged(0x06)(value)?;
                    application_context_name = ApplicationContextName::from_oid_bytes(oid);
                }
                // A2: result
                0xA2 => {
                    let (_, raw) = parse_small_integer(value)?;
                    let parsed = AssociationResult::from_u8(raw)
                        .ok_or_else(|| nom::Err::Error(Error::new(content, ErrorKind::Verify)))?;
                    result = Some(parsed);
                }
                // A3: result-source-diagnostic
                0xA3 => {
                    let (_, (source, inner)) = parse_tlv(value)?;
                    let (_, diagnostic) = parse_small_integer(inner)?;
                    result_source_diagnostic = match source {
                        0xA1 => ResultSourceDiagnostic::ServiceUser(diagnostic),
                        0xA2 => ResultSourceDiagnostic::ServiceProvider(diagnostic),
                        _ => return Err(nom::Err::Error(Error::new(value, ErrorKind::Tag))),
                    };
                }
                // A4: responding-AP-title
                0xA4 => {
                    let (_, title) = parse_tagged(0x04)(value)?;
                    responding_ap_title = Some(title.to_vec());
                }
                // AA: responding-authentication-value
                0xAA => {
                    let (_, challenge) = parse_tagged(0x80)(value)?;
                    responding_authentication_value = Some(challenge.to_vec());
                }
                // BE: user-information
                0xBE => {
                    let (_, apdu) = parse_tagged(0x04)(value)?;
                    user_information = Some(apdu.to_vec());
                }
                _ => {}
            }
            content = next;
        }

        let result = result.ok_or_else(|| nom::Err::Error(Error::new(input, ErrorKind::Complete)))?;

        Ok((
            rest,
            Self {
                application_context_name,
                result,
                result_source_diagnostic,
                responding_ap_title,
                responding_authentication_value,
                user_information,
            },
        ))
    }
}
