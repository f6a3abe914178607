use core::fmt;

use nom::{IResult, number::complete::u8};

/// Security control byte of a ciphered APDU (suite id, authentication,
/// encryption, broadcast and compression bits).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SecurityControl {
    security_control: u8,
}

impl fmt::Debug for SecurityControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityControl")
            .field("suite_id", &self.suite_id())
            .field("authentication", &self.authentication())
            .field("encryption", &self.encryption())
            .field("broadcast", &self.broadcast())
            .field("compression", &self.compression())
            .finish()
    }
}

impl SecurityControl {
    #[rustfmt::skip]
    const COMPRESSION_BIT:    u8 = 0b10000000;
    #[rustfmt::skip]
    const BROADCAST_BIT:      u8 = 0b01000000;
    #[rustfmt::skip]
    const ENCRYPTION_BIT:     u8 = 0b00100000;
    #[rustfmt::skip]
    const AUTHENTICATION_BIT: u8 = 0b00010000;

    pub const fn new(security_control: u8) -> Self {
        Self { security_control }
    }

    pub const fn from_flags(authentication: bool, encryption: bool) -> Self {
        let mut security_control = 0;
        if authentication {
            security_control |= Self::AUTHENTICATION_BIT;
        }
        if encryption {
            security_control |= Self::ENCRYPTION_BIT;
        }
        Self { security_control }
    }

    pub const fn bits(&self) -> u8 {
        self.security_control
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, security_control) = u8(input)?;
        Ok((input, Self { security_control }))
    }

    pub fn suite_id(&self) -> u8 {
        self.security_control & 0b00001111
    }

    pub fn authentication(&self) -> bool {
        (self.security_control & Self::AUTHENTICATION_BIT) != 0
    }

    pub fn set_authentication(&mut self, authentication: bool) {
        if authentication {
            self.security_control |= Self::AUTHENTICATION_BIT
        } else {
            self.security_control &= !Self::AUTHENTICATION_BIT
        }
    }

    pub fn encryption(&self) -> bool {
        (self.security_control & Self::ENCRYPTION_BIT) != 0
    }

    pub fn set_encryption(&mut self, encryption: bool) {
        if encryption {
            self.security_control |= Self::ENCRYPTION_BIT
        } else {
            self.security_control &= !Self::ENCRYPTION_BIT
        }
    }

    pub fn broadcast(&self) -> bool {
        (self.security_control & Self::BROADCAST_BIT) != 0
    }

    pub fn compression(&self) -> bool {
        (self.security_control & Self::COMPRESSION_BIT) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_security_control() {
        let input = [0x30, 0xFF];
        let (remaining, sc) = SecurityControl::parse(&input).unwrap();

        assert_eq!(remaining, &[0xFF]);
        assert_eq!(sc.bits(), 0x30);
        assert!(sc.authentication());
        assert!(sc.encryption());
    }

    #[test]
    fn test_suite_id() {
        assert_eq!(SecurityControl::new(0x00).suite_id(), 0);
        assert_eq!(SecurityControl::new(0xFF).suite_id(), 15);
        assert_eq!(SecurityControl::new(0xF0).suite_id(), 0);
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(SecurityControl::from_flags(true, false).bits(), 0x10);
        assert_eq!(SecurityControl::from_flags(false, true).bits(), 0x20);
        assert_eq!(SecurityControl::from_flags(true, true).bits(), 0x30);
        assert_eq!(SecurityControl::from_flags(false, false).bits(), 0x00);
    }

    #[test]
    fn test_set_bits() {
        let mut sc = SecurityControl::new(0x30);
        sc.set_encryption(false);
        assert_eq!(sc.bits(), 0x10);
        sc.set_authentication(false);
        sc.set_encryption(true);
        assert_eq!(sc.bits(), 0x20);
        assert!(!sc.broadcast());
        assert!(!sc.compression());
    }

    #[test]
    fn test_debug_format() {
        let debug = format!("{:?}", SecurityControl::new(0x10));
        assert!(debug.contains("authentication: true"));
        assert!(debug.contains("encryption: false"));
    }
}
