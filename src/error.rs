//! Error taxonomy for the session layer.
//!
//! Every fallible operation returns [`Error`]. Failures raised while driving
//! a message sequence carry the 1-based step at which they happened, and
//! [`Error::stage`] reports where in the request/response cycle the failure
//! originated.

use core::fmt;

use thiserror::Error;

use crate::codec::{CodecError, Command};
use crate::obis_code::ObisError;

/// Boxed error produced by a transport provider.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide result alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Where an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    Connect,
    Handshake,
    Build,
    Send,
    Receive,
    Decode,
    Remote,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::Connect => "connect",
            Stage::Handshake => "handshake",
            Stage::Build => "build",
            Stage::Send => "send",
            Stage::Receive => "receive",
            Stage::Decode => "decode",
            Stage::Remote => "remote",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("session is not connected")]
    NotConnected,

    #[error("invalid logical name: {0}")]
    InvalidObis(#[from] ObisError),

    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: TransportError,
    },

    #[error("association failed: {0}")]
    Handshake(#[source] CodecError),

    #[error("failed to build request: {0}")]
    Build(#[source] CodecError),

    #[error("send failed at step {step}: {source}")]
    Send {
        step: usize,
        #[source]
        source: TransportError,
    },

    #[error("receive failed at step {step}: {source}")]
    Receive {
        step: usize,
        #[source]
        source: TransportError,
    },

    #[error("failed to decode reply at step {step}: {source}")]
    Decode {
        step: usize,
        #[source]
        source: CodecError,
    },

    #[error("meter rejected step {step} ({command}) with status {status}")]
    Rejected { step: usize, command: Command, status: u8 },

    #[error("unexpected response data: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Returns the stage of the operation that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Error::InvalidConfiguration(_) | Error::NotConnected | Error::InvalidObis(_) => {
                Stage::Configuration
            }
            Error::Connect { .. } => Stage::Connect,
            Error::Handshake(_) => Stage::Handshake,
            Error::Build(_) => Stage::Build,
            Error::Send { .. } => Stage::Send,
            Error::Receive { .. } => Stage::Receive,
            Error::Decode { .. } | Error::InvalidResponse(_) => Stage::Decode,
            Error::Rejected { .. } => Stage::Remote,
        }
    }

    /// Returns the 1-based message step for errors raised by the exchange pump.
    pub fn step(&self) -> Option<usize> {
        match self {
            Error::Send { step, .. }
            | Error::Receive { step, .. }
            | Error::Decode { step, .. }
            | Error::Rejected { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_of_pump_errors() {
        let err = Error::Decode { step: 2, source: CodecError::Incomplete };
        assert_eq!(err.stage(), Stage::Decode);
        assert_eq!(err.step(), Some(2));

        let err = Error::Rejected { step: 1, command: Command::MethodResponse, status: 3 };
        assert_eq!(err.stage(), Stage::Remote);
        assert_eq!(err.to_string(), "meter rejected step 1 (method-response) with status 3");
    }

    #[test]
    fn test_stage_of_configuration_errors() {
        assert_eq!(Error::NotConnected.stage(), Stage::Configuration);
        assert_eq!(Error::NotConnected.step(), None);
        assert_eq!(
            Error::invalid_config("port must be greater than zero").to_string(),
            "invalid configuration: port must be greater than zero"
        );
    }

    #[test]
    fn test_obis_error_converts() {
        let err: Error = ObisError::ComponentCount(5).into();
        assert!(matches!(err, Error::InvalidObis(_)));
        assert_eq!(err.stage(), Stage::Configuration);
    }
}
