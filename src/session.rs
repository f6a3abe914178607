//! Meter session: configuration, connection lifecycle and attribute reads.
//!
//! A [`MeterSession`] owns its configuration, a [`Connector`], a [`Codec`]
//! and, while connected, the open transport. Every setter validates its
//! input and leaves the previous value untouched on failure.
//!
//! ```no_run
//! use dlms_meter::{MeterSession, Security, Authentication};
//!
//! # fn main() -> dlms_meter::Result<()> {
//! let mut session = MeterSession::new();
//! session.set_host("192.168.1.50")?;
//! session.set_authentication(Authentication::Low);
//! session.set_security(Security::None);
//! session.set_password("12345678");
//! session.connect()?;
//!
//! let serial = session.read_string("0.0.96.1.0.255", 1, 2)?;
//! println!("serial number: {serial}");
//! session.disconnect();
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use crate::codec::{
    Authentication, Codec, CodecError, CodecSettings, InterfaceType, LnCodec, Reply, Security,
};
use crate::data::{DateTime, TypedValue};
use crate::error::{Error, Result};
use crate::exchange::Exchange;
use crate::marshal::marshal;
use crate::obis_code::ObisCode;
use crate::transport::{Connector, Transport};
#[cfg(feature = "transport-tcp")]
use crate::transport::tcp::TcpConnector;

pub const DEFAULT_PORT: u16 = 4059;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_CLIENT_ADDRESS: u16 = 48;
pub const DEFAULT_SERVER_ADDRESS: u16 = 1;
pub const DEFAULT_ATTRIBUTE_INDEX: i8 = 3;
pub const DEFAULT_MAX_ENTRIES: u32 = 10;

pub const CLOCK_CLASS_ID: u16 = 8;
pub const CLOCK_TIME_ATTRIBUTE_ID: i8 = 2;
pub const CLOCK_LOGICAL_NAME: ObisCode = ObisCode::new(0, 0, 1, 0, 0, 255);

/// Session configuration. [`SessionConfig::default`] holds the defaults every
/// new session starts from.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub host: Option<String>,
    pub port: u16,
    pub timeout: Duration,
    pub password: Vec<u8>,
    pub system_title: Option<[u8; 8]>,
    pub block_cipher_key: Option<[u8; 16]>,
    pub authentication_key: Option<[u8; 16]>,
    pub client_address: u16,
    pub server_address: u16,
    /// Profile generic attribute holding the capture objects.
    pub attribute_index: i8,
    /// Page size of one-shot profile reads.
    pub max_entries: u32,
    pub authentication: Authentication,
    pub security: Security,
    pub interface_type: InterfaceType,
    pub invocation_counter: u32,
    pub wire_trace: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            password: Vec::new(),
            system_title: None,
            block_cipher_key: None,
            authentication_key: None,
            client_address: DEFAULT_CLIENT_ADDRESS,
            server_address: DEFAULT_SERVER_ADDRESS,
            attribute_index: DEFAULT_ATTRIBUTE_INDEX,
            max_entries: DEFAULT_MAX_ENTRIES,
            authentication: Authentication::default(),
            security: Security::default(),
            interface_type: InterfaceType::default(),
            invocation_counter: 0,
            wire_trace: false,
        }
    }
}

impl core::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("system_title", &self.system_title.map(hex::encode_upper))
            .field("client_address", &self.client_address)
            .field("server_address", &self.server_address)
            .field("attribute_index", &self.attribute_index)
            .field("max_entries", &self.max_entries)
            .field("authentication", &self.authentication)
            .field("security", &self.security)
            .field("invocation_counter", &self.invocation_counter)
            .field("wire_trace", &self.wire_trace)
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    pub fn codec_settings(&self) -> CodecSettings {
        CodecSettings {
            client_address: self.client_address,
            server_address: self.server_address,
            authentication: self.authentication,
            security: self.security,
            interface_type: self.interface_type,
            password: self.password.clone(),
            system_title: self.system_title,
            block_cipher_key: self.block_cipher_key,
            authentication_key: self.authentication_key,
            invocation_counter: self.invocation_counter,
            max_pdu_size: 0xFFFF,
        }
    }
}

/// A partial configuration applied with [`MeterSession::configure`].
///
/// Key material is given as hex text, the timeout in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MeterConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_ms: Option<u64>,
    pub password: Option<String>,
    pub system_title: Option<String>,
    pub block_cipher_key: Option<String>,
    pub authentication_key: Option<String>,
    pub client_address: Option<u16>,
    pub server_address: Option<u16>,
    pub attribute_index: Option<i8>,
    pub max_entries: Option<u32>,
    pub authentication: Option<Authentication>,
    pub security: Option<Security>,
    pub invocation_counter: Option<u32>,
    pub wire_trace: Option<bool>,
}

fn parse_hex<const N: usize>(field: &str, text: &str) -> Result<[u8; N]> {
    if text.len() != N * 2 {
        return Err(Error::invalid_config(format!(
            "{} must be {} hex characters, got {}",
            field,
            N * 2,
            text.len()
        )));
    }
    let mut bytes = [0u8; N];
    hex::decode_to_slice(text, &mut bytes)
        .map_err(|err| Error::invalid_config(format!("{} is not valid hex: {}", field, err)))?;
    Ok(bytes)
}

/// A client session with one meter.
pub struct MeterSession<C: Connector, K: Codec = LnCodec> {
    config: SessionConfig,
    connector: C,
    codec: K,
    transport: Option<C::Transport>,
}

impl<C: Connector, K: Codec> core::fmt::Debug for MeterSession<C, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MeterSession")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "transport-tcp")]
impl MeterSession<TcpConnector> {
    /// A session with default configuration, connecting over TCP.
    pub fn new() -> Self {
        Self::with_parts(TcpConnector, LnCodec::new())
    }
}

#[cfg(feature = "transport-tcp")]
impl Default for MeterSession<TcpConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector, K: Codec> MeterSession<C, K> {
    pub fn with_parts(connector: C, codec: K) -> Self {
        Self { config: SessionConfig::default(), connector, codec, transport: None }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn codec(&self) -> &K {
        &self.codec
    }

    /// Whether the session holds an associated connection. Never touches the
    /// network.
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    pub fn set_host(&mut self, host: &str) -> Result<()> {
        if host.trim().is_empty() {
            return Err(Error::invalid_config("host must not be empty"));
        }
        self.config.host = Some(host.to_owned());
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<()> {
        if port == 0 {
            return Err(Error::invalid_config("port must not be 0"));
        }
        self.config.port = port;
        Ok(())
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(Error::invalid_config("timeout must be positive"));
        }
        self.config.timeout = timeout;
        Ok(())
    }

    /// Sets the LLS password. An empty password clears it.
    pub fn set_password(&mut self, password: &str) {
        self.config.password = password.as_bytes().to_vec();
    }

    /// Sets the client system title from 16 hex characters.
    pub fn set_system_title(&mut self, hex: &str) -> Result<()> {
        self.config.system_title = Some(parse_hex("system title", hex)?);
        Ok(())
    }

    /// Sets the block cipher key from 32 hex characters.
    pub fn set_block_cipher_key(&mut self, hex: &str) -> Result<()> {
        self.config.block_cipher_key = Some(parse_hex("block cipher key", hex)?);
        Ok(())
    }

    /// Sets the authentication key from 32 hex characters.
    pub fn set_authentication_key(&mut self, hex: &str) -> Result<()> {
        self.config.authentication_key = Some(parse_hex("authentication key", hex)?);
        Ok(())
    }

    pub fn set_client_address(&mut self, address: u16) {
        self.config.client_address = address;
    }

    pub fn set_server_address(&mut self, address: u16) {
        self.config.server_address = address;
    }

    pub fn set_attribute_index(&mut self, index: i8) -> Result<()> {
        if index <= 0 {
            return Err(Error::invalid_config("attribute index must be positive"));
        }
        self.config.attribute_index = index;
        Ok(())
    }

    pub fn set_max_entries(&mut self, max_entries: u32) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::invalid_config("max entries must be positive"));
        }
        self.config.max_entries = max_entries;
        Ok(())
    }

    pub fn set_authentication(&mut self, authentication: Authentication) {
        self.config.authentication = authentication;
    }

    pub fn set_security(&mut self, security: Security) {
        self.config.security = security;
    }

    /// Sets the invocation counter the next association starts from.
    pub fn set_invocation_counter(&mut self, invocation_counter: u32) {
        self.config.invocation_counter = invocation_counter;
    }

    pub fn set_wire_trace(&mut self, enabled: bool) {
        self.config.wire_trace = enabled;
    }

    /// Applies every present field of `config`, stopping at the first
    /// rejected one.
    pub fn configure(&mut self, config: &MeterConfig) -> Result<()> {
        if let Some(ref host) = config.host {
            self.set_host(host)?;
        }
        if let Some(port) = config.port {
            self.set_port(port)?;
        }
        if let Some(timeout_ms) = config.timeout_ms {
            self.set_timeout(Duration::from_millis(timeout_ms))?;
        }
        if let Some(ref password) = config.password {
            self.set_password(password);
        }
        if let Some(ref system_title) = config.system_title {
            self.set_system_title(system_title)?;
        }
        if let Some(ref key) = config.block_cipher_key {
            self.set_block_cipher_key(key)?;
        }
        if let Some(ref key) = config.authentication_key {
            self.set_authentication_key(key)?;
        }
        if let Some(address) = config.client_address {
            self.set_client_address(address);
        }
        if let Some(address) = config.server_address {
            self.set_server_address(address);
        }
        if let Some(index) = config.attribute_index {
            self.set_attribute_index(index)?;
        }
        if let Some(max_entries) = config.max_entries {
            self.set_max_entries(max_entries)?;
        }
        if let Some(authentication) = config.authentication {
            self.set_authentication(authentication);
        }
        if let Some(security) = config.security {
            self.set_security(security);
        }
        if let Some(invocation_counter) = config.invocation_counter {
            self.set_invocation_counter(invocation_counter);
        }
        if let Some(wire_trace) = config.wire_trace {
            self.set_wire_trace(wire_trace);
        }
        Ok(())
    }

    /// Opens the transport and associates.
    ///
    /// On failure the transport is closed and the codec cleared, so the
    /// session is left disconnected. Connecting a connected session does
    /// nothing.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let host = self.config.host.clone().ok_or_else(|| Error::invalid_config("host is not set"))?;
        self.codec
            .initialize(&self.config.codec_settings())
            .map_err(|err| Error::invalid_config(err.to_string()))?;

        let address = format!("{}:{}", host, self.config.port);
        log::debug!("connecting to {} ({:?}, {:?})", address, self.config.authentication, self.config.security);

        let mut transport = match self.connector.connect(&host, self.config.port, self.config.timeout) {
            Ok(transport) => transport,
            Err(err) => {
                self.codec.clear();
                return Err(Error::Connect { address, source: err.into() });
            }
        };

        match self.associate(&mut transport) {
            Ok(()) => {
                log::info!("associated with {}", address);
                self.transport = Some(transport);
                Ok(())
            }
            Err(err) => {
                log::debug!("association with {} failed: {}", address, err);
                if let Err(close_err) = transport.close() {
                    log::warn!("closing {} failed: {}", address, close_err);
                }
                self.config.invocation_counter = self.codec.invocation_counter();
                self.codec.clear();
                Err(err)
            }
        }
    }

    fn associate(&mut self, transport: &mut C::Transport) -> Result<()> {
        let wire_trace = self.config.wire_trace;

        let messages = self.codec.association_request().map_err(Error::Handshake)?;
        Exchange::new(&mut *transport, &mut self.codec, wire_trace).run(messages)?;

        let Some(messages) = self.codec.authentication_request().map_err(Error::Handshake)? else {
            return Ok(());
        };
        log::debug!("HLS pass 3");
        let replies = Exchange::new(&mut *transport, &mut self.codec, wire_trace).run(messages)?;
        let reply = replies.last().ok_or_else(|| Error::InvalidResponse("no HLS pass 4 reply".to_owned()))?;
        self.codec.verify_authentication(reply).map_err(Error::Handshake)
    }

    /// Releases the association and closes the transport. Release failures
    /// are logged and otherwise ignored; disconnecting a disconnected
    /// session does nothing.
    pub fn disconnect(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            return;
        };

        match self.codec.release_request() {
            Ok(messages) => {
                if let Err(err) = Exchange::new(&mut transport, &mut self.codec, self.config.wire_trace).run(messages) {
                    log::warn!("release request failed: {}", err);
                }
            }
            Err(err) => log::warn!("cannot build release request: {}", err),
        }

        if let Err(err) = transport.close() {
            log::warn!("closing transport failed: {}", err);
        }

        self.config.invocation_counter = self.codec.invocation_counter();
        self.codec.clear();
        log::info!("disconnected");
    }

    pub(crate) fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    /// Checks the connection, then parses `obis`.
    pub(crate) fn resolve(&self, obis: &str) -> Result<ObisCode> {
        self.ensure_connected()?;
        Ok(obis.parse()?)
    }

    /// Builds a message sequence with the codec and drives it through the
    /// exchange pump.
    pub(crate) fn exchange<F>(&mut self, build: F) -> Result<Vec<Reply>>
    where
        F: FnOnce(&mut K) -> Result<Vec<Vec<u8>>, CodecError>,
    {
        let transport = self.transport.as_mut().ok_or(Error::NotConnected)?;
        let messages = build(&mut self.codec).map_err(Error::Build)?;
        Exchange::new(transport, &mut self.codec, self.config.wire_trace).run(messages)
    }

    /// Reads one attribute and returns the value of the final reply.
    pub(crate) fn read_value(&mut self, class_id: u16, obis: &ObisCode, attribute: i8) -> Result<TypedValue> {
        log::debug!("read {} class {} attribute {}", obis, class_id, attribute);
        let replies = self.exchange(|codec| codec.read_request(class_id, obis, attribute))?;
        replies
            .into_iter()
            .last()
            .and_then(|reply| reply.value)
            .ok_or_else(|| Error::InvalidResponse(format!("{} attribute {} returned no data", obis, attribute)))
    }

    /// Reads attribute `attribute` of object `obis` of class `class_id`.
    pub fn read(&mut self, obis: &str, class_id: u16, attribute: i8) -> Result<TypedValue> {
        let obis = self.resolve(obis)?;
        self.read_value(class_id, &obis, attribute)
    }

    /// Like [`read`](Self::read), returning the marshaled display string.
    pub fn read_string(&mut self, obis: &str, class_id: u16, attribute: i8) -> Result<String> {
        let value = self.read(obis, class_id, attribute)?;
        Ok(marshal(Some(&value)))
    }

    /// Reads the meter clock (`0.0.1.0.0.255`, attribute 2). An octet-string
    /// answer is interpreted as a date-time.
    pub fn read_clock(&mut self) -> Result<TypedValue> {
        self.ensure_connected()?;
        let value = self.read_value(CLOCK_CLASS_ID, &CLOCK_LOGICAL_NAME, CLOCK_TIME_ATTRIBUTE_ID)?;
        Ok(clock_value(value))
    }
}

/// Interprets a 12-byte octet string as a COSEM date-time.
pub(crate) fn clock_value(value: TypedValue) -> TypedValue {
    match value {
        TypedValue::OctetString(ref bytes) if bytes.len() == DateTime::ENCODED_LEN => {
            TypedValue::DateTime(DateTime::from_bytes(bytes))
        }
        other => other,
    }
}

impl<C: Connector, K: Codec> Drop for MeterSession<C, K> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
