//! Glo-ciphering with AES-128-GCM and a 12-byte authentication tag.
//!
//! A protected APDU is `tag || length || SC || IC || body`, where SC is the
//! [`SecurityControl`] byte, IC the big-endian invocation counter and the
//! GCM initialisation vector is the sender's system title followed by IC.
//! The additional authenticated data starts with `SC || AK`.

use aes::Aes128;
use aes_gcm::AesGcm;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use cipher::consts::U12;
use nom::{
    IResult, Parser,
    bytes::complete::take,
    number::complete::{be_u32, u8},
};
use thiserror::Error;

use crate::SecurityControl;
use crate::data::{encode_length, parse_length};

/// AES-128-GCM with 96-bit nonces and 96-bit tags.
type Aes128Gcm12 = AesGcm<Aes128, U12, U12>;

pub const TAG_LEN: usize = 12;

pub const GLO_INITIATE_REQUEST: u8 = 0x21;
pub const GLO_INITIATE_RESPONSE: u8 = 0x28;
pub const GLO_GET_REQUEST: u8 = 0xC8;
pub const GLO_SET_REQUEST: u8 = 0xC9;
pub const GLO_ACTION_REQUEST: u8 = 0xCB;
pub const GLO_GET_RESPONSE: u8 = 0xCC;
pub const GLO_SET_RESPONSE: u8 = 0xCD;
pub const GLO_ACTION_RESPONSE: u8 = 0xCF;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("ciphered APDU is malformed")]
    Malformed,
    #[error("authentication tag mismatch")]
    TagMismatch,
    #[error("security control 0x{0:02X} carries no protection")]
    Unprotected(u8),
}

/// Holds the keys of one association.
#[derive(Clone)]
pub struct GloCipher {
    block_cipher_key: [u8; 16],
    authentication_key: [u8; 16],
}

impl core::fmt::Debug for GloCipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GloCipher").finish_non_exhaustive()
    }
}

impl GloCipher {
    pub fn new(block_cipher_key: [u8; 16], authentication_key: [u8; 16]) -> Self {
        Self { block_cipher_key, authentication_key }
    }

    fn cipher(&self) -> Aes128Gcm12 {
        Aes128Gcm12::new(&self.block_cipher_key.into())
    }

    fn nonce(system_title: &[u8; 8], invocation_counter: u32) -> [u8; 12] {
        let mut iv = [0u8; 12];
        iv[..8].copy_from_slice(system_title);
        iv[8..].copy_from_slice(&invocation_counter.to_be_bytes());
        iv
    }

    fn aad(&self, security_control: SecurityControl, extra: &[u8]) -> Vec<u8> {
        let mut aad = Vec::with_capacity(1 + 16 + extra.len());
        aad.push(security_control.bits());
        aad.extend_from_slice(&self.authentication_key);
        aad.extend_from_slice(extra);
        aad
    }

    /// Protects `plaintext` and returns `SC || IC || body`.
    pub fn encrypt(
        &self,
        security_control: SecurityControl,
        system_title: &[u8; 8],
        invocation_counter: u32,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        let nonce = Self::nonce(system_title, invocation_counter);
        let mut out = Vec::with_capacity(5 + plaintext.len() + TAG_LEN);
        out.push(security_control.bits());
        out.extend_from_slice(&invocation_counter.to_be_bytes());

        match (security_control.authentication(), security_control.encryption()) {
            (true, true) => {
                let mut body = plaintext.to_vec();
                let tag = self
                    .cipher()
                    .encrypt_in_place_detached(&nonce.into(), &self.aad(security_control, &[]), &mut body)
                    .map_err(|_| CipherError::Malformed)?;
                out.extend_from_slice(&body);
                out.extend_from_slice(&tag);
            }
            (true, false) => {
                let tag = self
                    .cipher()
                    .encrypt_in_place_detached(&nonce.into(), &self.aad(security_control, plaintext), &mut [])
                    .map_err(|_| CipherError::Malformed)?;
                out.extend_from_slice(plaintext);
                out.extend_from_slice(&tag);
            }
            (false, true) => {
                let mut body = plaintext.to_vec();
                self.cipher()
                    .encrypt_in_place_detached(&nonce.into(), &[], &mut body)
                    .map_err(|_| CipherError::Malformed)?;
                out.extend_from_slice(&body);
            }
            (false, false) => return Err(CipherError::Unprotected(security_control.bits())),
        }

        Ok(out)
    }

    /// Removes the protection of `SC || IC || body` sent by `system_title`.
    pub fn decrypt(&self, system_title: &[u8; 8], protected: &[u8]) -> Result<Vec<u8>, CipherError> {
        let (body, (security_control, invocation_counter)) =
            parse_header(protected).map_err(|_| CipherError::Malformed)?;
        let nonce = Self::nonce(system_title, invocation_counter);

        let split_tag = |body: &[u8]| -> Result<(Vec<u8>, [u8; TAG_LEN]), CipherError> {
            let split = body.len().checked_sub(TAG_LEN).ok_or(CipherError::Malformed)?;
            let mut tag = [0u8; TAG_LEN];
            tag.copy_from_slice(&body[split..]);
            Ok((body[..split].to_vec(), tag))
        };

        match (security_control.authentication(), security_control.encryption()) {
            (true, true) => {
                let (mut payload, tag) = split_tag(body)?;
                self.cipher()
                    .decrypt_in_place_detached(
                        &nonce.into(),
                        &self.aad(security_control, &[]),
                        &mut payload,
                        aes_gcm::Tag::<U12>::from_slice(&tag),
                    )
                    .map_err(|_| CipherError::TagMismatch)?;
                Ok(payload)
            }
            (true, false) => {
                let (payload, tag) = split_tag(body)?;
                self.cipher()
                    .decrypt_in_place_detached(
                        &nonce.into(),
                        &self.aad(security_control, &payload),
                        &mut [],
                        aes_gcm::Tag::<U12>::from_slice(&tag),
                    )
                    .map_err(|_| CipherError::TagMismatch)?;
                Ok(payload)
            }
            (false, true) => {
                // Without a tag GCM reduces to CTR mode, which is its own inverse.
                let mut payload = body.to_vec();
                self.cipher()
                    .encrypt_in_place_detached(&nonce.into(), &[], &mut payload)
                    .map_err(|_| CipherError::Malformed)?;
                Ok(payload)
            }
            (false, false) => Err(CipherError::Unprotected(security_control.bits())),
        }
    }

    /// Computes the GMAC of `challenge` used by HLS pass 3 and 4.
    pub fn gmac(
        &self,
        security_control: SecurityControl,
        system_title: &[u8; 8],
        invocation_counter: u32,
        challenge: &[u8],
    ) -> Result<[u8; TAG_LEN], CipherError> {
        let nonce = Self::nonce(system_title, invocation_counter);
        let tag = self
            .cipher()
            .encrypt_in_place_detached(&nonce.into(), &self.aad(security_control, challenge), &mut [])
            .map_err(|_| CipherError::Malformed)?;

        let mut out = [0u8; TAG_LEN];
        out.copy_from_slice(&tag);
        Ok(out)
    }
}

fn parse_header(input: &[u8]) -> IResult<&[u8], (SecurityControl, u32)> {
    (SecurityControl::parse, be_u32).parse(input)
}

/// Wraps protected content into a glo APDU: `tag || length || content`.
pub fn wrap(tag: u8, protected: &[u8]) -> Vec<u8> {
    let mut apdu = Vec::with_capacity(protected.len() + 4);
    apdu.push(tag);
    encode_length(&mut apdu, protected.len());
    apdu.extend_from_slice(protected);
    apdu
}

/// Splits a glo APDU into its tag and protected content.
pub fn unwrap(input: &[u8]) -> IResult<&[u8], (u8, &[u8])> {
    let (input, tag) = u8(input)?;
    let (input, len) = parse_length(input)?;
    let (input, content) = take(len).parse(input)?;
    Ok((input, (tag, content)))
}

/// The glo tag protecting an unciphered xDLMS request tag.
pub fn glo_request_tag(tag: u8) -> Option<u8> {
    match tag {
        0x01 => Some(GLO_INITIATE_REQUEST),
        0xC0 => Some(GLO_GET_REQUEST),
        0xC1 => Some(GLO_SET_REQUEST),
        0xC3 => Some(GLO_ACTION_REQUEST),
        _ => None,
    }
}

pub fn is_glo_response(tag: u8) -> bool {
    matches!(tag, GLO_INITIATE_RESPONSE | GLO_GET_RESPONSE | GLO_SET_RESPONSE | GLO_ACTION_RESPONSE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM_TITLE: [u8; 8] = [0x4D, 0x4D, 0x4D, 0x00, 0x00, 0xBC, 0x61, 0x4E];
    const KEY: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
    ];
    const AK: [u8; 16] = [
        0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xDB, 0xDC, 0xDD, 0xDE, 0xDF,
    ];

    fn cipher() -> GloCipher {
        GloCipher::new(KEY, AK)
    }

    #[test]
    fn test_authenticated_encryption() {
        let plaintext = [0xC0, 0x01, 0xC1, 0x00, 0x08, 0x00, 0x00, 0x01, 0x00, 0x00, 0xFF, 0x02, 0x00];
        let protected = cipher().encrypt(SecurityControl::new(0x30), &SYSTEM_TITLE, 1, &plaintext).unwrap();

        assert_eq!(&protected[..5], &[0x30, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(protected.len(), 5 + plaintext.len() + TAG_LEN);
        assert_ne!(&protected[5..5 + plaintext.len()], &plaintext);

        assert_eq!(cipher().decrypt(&SYSTEM_TITLE, &protected).unwrap(), plaintext);
    }

    #[test]
    fn test_tampered_ciphertext() {
        let mut protected = cipher().encrypt(SecurityControl::new(0x30), &SYSTEM_TITLE, 7, &[1, 2, 3]).unwrap();
        protected[6] ^= 0x01;
        assert_eq!(cipher().decrypt(&SYSTEM_TITLE, &protected), Err(CipherError::TagMismatch));
    }

    #[test]
    fn test_wrong_system_title() {
        let protected = cipher().encrypt(SecurityControl::new(0x30), &SYSTEM_TITLE, 7, &[1, 2, 3]).unwrap();
        assert_eq!(cipher().decrypt(&[0u8; 8], &protected), Err(CipherError::TagMismatch));
    }

    #[test]
    fn test_authentication_only_keeps_plaintext() {
        let protected = cipher().encrypt(SecurityControl::new(0x10), &SYSTEM_TITLE, 2, &[0xAA, 0xBB]).unwrap();

        assert_eq!(&protected[5..7], &[0xAA, 0xBB]);
        assert_eq!(protected.len(), 7 + TAG_LEN);
        assert_eq!(cipher().decrypt(&SYSTEM_TITLE, &protected).unwrap(), [0xAA, 0xBB]);
    }

    #[test]
    fn test_encryption_only() {
        let protected = cipher().encrypt(SecurityControl::new(0x20), &SYSTEM_TITLE, 3, &[0x01, 0x02, 0x03]).unwrap();

        assert_eq!(protected.len(), 8);
        assert_eq!(cipher().decrypt(&SYSTEM_TITLE, &protected).unwrap(), [0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_unprotected_rejected() {
        assert_eq!(
            cipher().encrypt(SecurityControl::new(0x00), &SYSTEM_TITLE, 0, &[1]),
            Err(CipherError::Unprotected(0))
        );
        assert_eq!(cipher().decrypt(&SYSTEM_TITLE, &[0x30, 0x00]), Err(CipherError::Malformed));
    }

    #[test]
    fn test_gmac_matches_authentication_only_tag() {
        let challenge = b"P6wRJ21F";
        let tag = cipher().gmac(SecurityControl::new(0x10), &SYSTEM_TITLE, 1, challenge).unwrap();
        let protected = cipher().encrypt(SecurityControl::new(0x10), &SYSTEM_TITLE, 1, challenge).unwrap();

        assert_eq!(&protected[protected.len() - TAG_LEN..], &tag);
        assert_ne!(tag, cipher().gmac(SecurityControl::new(0x10), &SYSTEM_TITLE, 2, challenge).unwrap());
    }

    #[test]
    fn test_wrap_unwrap() {
        let apdu = wrap(GLO_GET_REQUEST, &[0x30, 0, 0, 0, 1, 0xAB]);
        assert_eq!(apdu, [0xC8, 0x06, 0x30, 0x00, 0x00, 0x00, 0x01, 0xAB]);

        let (rest, (tag, content)) = unwrap(&apdu).unwrap();
        assert!(rest.is_empty());
        assert_eq!(tag, GLO_GET_REQUEST);
        assert_eq!(content.len(), 6);
    }

    #[test]
    fn test_glo_tags() {
        assert_eq!(glo_request_tag(0xC0), Some(GLO_GET_REQUEST));
        assert_eq!(glo_request_tag(0x62), None);
        assert!(is_glo_response(0xCF));
        assert!(!is_glo_response(0xC4));
    }
}
