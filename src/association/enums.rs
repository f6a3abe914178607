//! Enumerations for AARQ/AARE APDUs

use core::fmt;

/// Association result returned in AARE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AssociationResult {
    Accepted = 0,
    RejectedPermanent = 1,
    RejectedTransient = 2,
}

impl AssociationResult {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Accepted),
            1 => Some(Self::RejectedPermanent),
            2 => Some(Self::RejectedTransient),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AssociationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "Accepted"),
            Self::RejectedPermanent => write!(f, "Rejected (Permanent)"),
            Self::RejectedTransient => write!(f, "Rejected (Transient)"),
        }
    }
}

/// ACSE service user diagnostics, the reason for an association rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AcseServiceUserDiagnostics {
    Null = 0,
    NoReasonGiven = 1,
    ApplicationContextNameNotSupported = 2,
    AuthenticationMechanismNameNotRecognised = 11,
    AuthenticationMechanismNameRequired = 12,
    AuthenticationFailure = 13,
    /// Sent with an accepted AARE when HLS pass 3/4 must follow.
    AuthenticationRequired = 14,
}

impl AcseServiceUserDiagnostics {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Null),
            1 => Some(Self::NoReasonGiven),
            2 => Some(Self::ApplicationContextNameNotSupported),
            11 => Some(Self::AuthenticationMechanismNameNotRecognised),
            12 => Some(Self::AuthenticationMechanismNameRequired),
            13 => Some(Self::AuthenticationFailure),
            14 => Some(Self::AuthenticationRequired),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AcseServiceUserDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::NoReasonGiven => write!(f, "No reason given"),
            Self::ApplicationContextNameNotSupported => {
                write!(f, "Application context name not supported")
            }
            Self::AuthenticationMechanismNameNotRecognised => {
                write!(f, "Authentication mechanism name not recognised")
            }
            Self::AuthenticationMechanismNameRequired => {
                write!(f, "Authentication mechanism name required")
            }
            Self::AuthenticationFailure => write!(f, "Authentication failure"),
            Self::AuthenticationRequired => write!(f, "Authentication required"),
        }
    }
}

/// Application context name, encoded as an ASN.1 OBJECT IDENTIFIER
///
/// Only logical-name referencing is spoken by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationContextName {
    /// OID 2.16.756.5.8.1.1
    LogicalNameReferencing,
    /// OID 2.16.756.5.8.1.3
    LogicalNameReferencingWithCiphering,
}

impl ApplicationContextName {
    pub fn oid_bytes(&self) -> &'static [u8] {
        match self {
            Self::LogicalNameReferencing => &[0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01],
            Self::LogicalNameReferencingWithCiphering => &[0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x03],
        }
    }

    pub fn from_oid_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01] => Some(Self::LogicalNameReferencing),
            [0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x03] => {
                Some(Self::LogicalNameReferencingWithCiphering)
            }
            _ => None,
        }
    }
}

/// Authentication mechanism name (OID 2.16.756.5.8.2.x)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MechanismName {
    LowestLevel,
    LowLevel,
    HighLevelGmac,
}

impl MechanismName {
    pub fn oid_bytes(&self) -> &'static [u8] {
        match self {
            Self::LowestLevel => &[0x60, 0x85, 0x74, 0x05, 0x08, 0x02, 0x00],
            Self::LowLevel => &[0x60, 0x85, 0x74, 0x05, 0x08, 0x02, 0x01],
            Self::HighLevelGmac => &[0x60, 0x85, 0x74, 0x05, 0x08, 0x02, 0x05],
        }
    }
}

impl fmt::Display for MechanismName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowestLevel => write!(f, "Lowest Level Security"),
            Self::LowLevel => write!(f, "Low Level Security (LLS)"),
            Self::HighLevelGmac => write!(f, "High Level Security - GMAC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_association_result() {
        assert_eq!(AssociationResult::from_u8(0), Some(AssociationResult::Accepted));
        assert_eq!(AssociationResult::from_u8(2), Some(AssociationResult::RejectedTransient));
        assert_eq!(AssociationResult::from_u8(3), None);
        assert_eq!(AssociationResult::RejectedPermanent.as_u8(), 1);
    }

    #[test]
    fn test_diagnostics_from_u8() {
        assert_eq!(
            AcseServiceUserDiagnostics::from_u8(14),
            Some(AcseServiceUserDiagnostics::AuthenticationRequired)
        );
        assert_eq!(AcseServiceUserDiagnostics::from_u8(3), None);
    }

    #[test]
    fn test_context_oid_roundtrip() {
        for context in [
            ApplicationContextName::LogicalNameReferencing,
            ApplicationContextName::LogicalNameReferencingWithCiphering,
        ] {
            assert_eq!(ApplicationContextName::from_oid_bytes(context.oid_bytes()), Some(context));
        }
        assert_eq!(ApplicationContextName::from_oid_bytes(&[0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x02]), None);
    }

    #[test]
    fn test_mechanism_oid() {
        assert_eq!(MechanismName::HighLevelGmac.oid_bytes()[6], 5);
        assert_eq!(MechanismName::LowLevel.to_string(), "Low Level Security (LLS)");
    }
}
