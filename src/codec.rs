//! Protocol codec seam.
//!
//! The session layer never touches APDU bytes itself: a [`Codec`] builds the
//! framed message sequence for each logical operation and turns received
//! bytes back into a [`Reply`]. [`LnCodec`] is the bundled implementation
//! (logical-name referencing over the TCP wrapper).

use core::fmt;

use thiserror::Error;

use crate::data::TypedValue;
use crate::general_glo_ciphering::CipherError;
use crate::obis_code::ObisCode;

mod ln;

pub use self::ln::LnCodec;

/// Invoke-id-and-priority of every request: invoke id 1, confirmed, high
/// priority.
pub const INVOKE_ID_AND_PRIORITY: u8 = 0xC1;

/// Authentication mechanism used when associating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Authentication {
    None,
    /// Password (LLS).
    Low,
    /// HLS with a GMAC challenge/response.
    #[default]
    HighGmac,
}

/// Protection applied to xDLMS APDUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Security {
    None,
    Authentication,
    Encryption,
    #[default]
    AuthenticationEncryption,
}

impl Security {
    pub fn is_ciphered(&self) -> bool {
        *self != Security::None
    }
}

/// Framing between the codec and the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InterfaceType {
    /// IEC 62056-47 wrapper.
    #[default]
    Wrapper,
}

/// Everything a codec needs to associate.
#[derive(Clone, PartialEq, Eq)]
pub struct CodecSettings {
    pub client_address: u16,
    pub server_address: u16,
    pub authentication: Authentication,
    pub security: Security,
    pub interface_type: InterfaceType,
    pub password: Vec<u8>,
    pub system_title: Option<[u8; 8]>,
    pub block_cipher_key: Option<[u8; 16]>,
    pub authentication_key: Option<[u8; 16]>,
    pub invocation_counter: u32,
    pub max_pdu_size: u16,
}

impl fmt::Debug for CodecSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecSettings")
            .field("client_address", &self.client_address)
            .field("server_address", &self.server_address)
            .field("authentication", &self.authentication)
            .field("security", &self.security)
            .field("interface_type", &self.interface_type)
            .field("system_title", &self.system_title.map(hex::encode_upper))
            .field("invocation_counter", &self.invocation_counter)
            .field("max_pdu_size", &self.max_pdu_size)
            .finish_non_exhaustive()
    }
}

/// Kind of a decoded reply, named after the APDU that carried it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Aare,
    ReleaseResponse,
    GetResponse,
    SetResponse,
    MethodResponse,
    ExceptionResponse,
    ConfirmedServiceError,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Aare => "aare",
            Command::ReleaseResponse => "release-response",
            Command::GetResponse => "get-response",
            Command::SetResponse => "set-response",
            Command::MethodResponse => "method-response",
            Command::ExceptionResponse => "exception-response",
            Command::ConfirmedServiceError => "confirmed-service-error",
        };
        f.write_str(name)
    }
}

/// One decoded reply.
///
/// `status` is the data-access-result (GET/SET), action-result (ACTION),
/// association result (AARE) or service error code; zero means success.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub command: Command,
    pub status: u8,
    pub value: Option<TypedValue>,
    /// Another data block must be requested before the value is complete.
    pub more_data: bool,
}

impl Reply {
    pub fn new(command: Command, status: u8, value: Option<TypedValue>) -> Self {
        Self { command, status, value, more_data: false }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("{0} is not configured")]
    MissingSecurityMaterial(&'static str),

    #[error("message of {0} bytes does not fit a frame")]
    TooLarge(usize),

    #[error("invalid wrapper frame")]
    Frame,

    #[error("frame addressed from {source_port} to {destination_port}")]
    UnexpectedAddress { source_port: u16, destination_port: u16 },

    #[error("malformed {0}")]
    Malformed(&'static str),

    #[error("data ended before the value was complete")]
    Incomplete,

    #[error("unexpected APDU tag 0x{0:02X}")]
    UnexpectedApdu(u8),

    #[error("invoke id 0x{actual:02X} does not match request 0x{expected:02X}")]
    InvokeIdMismatch { expected: u8, actual: u8 },

    #[error("confirmed service error (service {service}, class {class}, code {code})")]
    ServiceError { service: u8, class: u8, code: u8 },

    #[error("meter failed HLS authentication")]
    AuthenticationFailed,

    #[error("no block transfer in progress")]
    NoBlockTransfer,

    #[error("random source failed: {0}")]
    Random(getrandom::Error),

    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// Builds request messages and decodes replies for one association.
///
/// Every builder returns the complete, framed messages of one logical
/// operation in send order.
pub trait Codec {
    /// Resets the codec and validates `settings` for a new association.
    fn initialize(&mut self, settings: &CodecSettings) -> Result<(), CodecError>;

    /// Forgets all association state.
    fn clear(&mut self);

    /// Current invocation counter, to be persisted across associations.
    fn invocation_counter(&self) -> u32;

    fn association_request(&mut self) -> Result<Vec<Vec<u8>>, CodecError>;

    /// Messages of the HLS pass 3, or `None` when the association needs no
    /// further authentication step.
    fn authentication_request(&mut self) -> Result<Option<Vec<Vec<u8>>>, CodecError>;

    /// Checks the meter's HLS pass 4 answer.
    fn verify_authentication(&mut self, reply: &Reply) -> Result<(), CodecError>;

    fn release_request(&mut self) -> Result<Vec<Vec<u8>>, CodecError>;

    fn read_request(&mut self, class_id: u16, obis: &ObisCode, attribute: i8) -> Result<Vec<Vec<u8>>, CodecError>;

    /// Reads `count` buffer entries starting at the 1-based `index`.
    fn read_rows_by_entry_request(
        &mut self,
        class_id: u16,
        obis: &ObisCode,
        attribute: i8,
        index: u32,
        count: u32,
    ) -> Result<Vec<Vec<u8>>, CodecError>;

    fn write_request(
        &mut self,
        class_id: u16,
        obis: &ObisCode,
        attribute: i8,
        value: &TypedValue,
    ) -> Result<Vec<Vec<u8>>, CodecError>;

    fn method_request(
        &mut self,
        class_id: u16,
        obis: &ObisCode,
        method: i8,
        parameters: Option<&TypedValue>,
    ) -> Result<Vec<Vec<u8>>, CodecError>;

    /// Requests the next data block after a reply with `more_data` set.
    fn next_block_request(&mut self) -> Result<Vec<u8>, CodecError>;

    /// Decodes received bytes. `Ok(None)` means the frame is not complete
    /// yet and more bytes must be received.
    fn decode(&mut self, data: &[u8]) -> Result<Option<Reply>, CodecError>;
}
