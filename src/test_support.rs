//! Scripted transport and frame builders shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crate::codec::{Authentication, Codec, CodecSettings, InterfaceType, LnCodec, Security};
use crate::data::TypedValue;
use crate::transport::{Connector, Transport};
use crate::wrapper::encode_frame;

#[derive(Debug, Default)]
struct ScriptState {
    replies: RefCell<VecDeque<Vec<u8>>>,
    sent: RefCell<Vec<Vec<u8>>>,
    send_limit: Cell<Option<usize>>,
    closed: Cell<usize>,
    connects: RefCell<Vec<(String, u16, Duration)>>,
    refuse_connect: Cell<bool>,
}

/// Shared script: queued replies in, sent messages out.
#[derive(Debug, Clone, Default)]
pub(crate) struct Script(Rc<ScriptState>);

impl Script {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues one `recv` result. An exhausted queue reads as a peer close.
    pub(crate) fn reply(&self, data: Vec<u8>) {
        self.0.replies.borrow_mut().push_back(data);
    }

    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.0.sent.borrow().clone()
    }

    pub(crate) fn fail_sends_after(&self, count: usize) {
        self.0.send_limit.set(Some(count));
    }

    pub(crate) fn refuse_connect(&self) {
        self.0.refuse_connect.set(true);
    }

    pub(crate) fn closed(&self) -> usize {
        self.0.closed.get()
    }

    pub(crate) fn connects(&self) -> Vec<(String, u16, Duration)> {
        self.0.connects.borrow().clone()
    }

    pub(crate) fn pending_replies(&self) -> usize {
        self.0.replies.borrow().len()
    }
}

#[derive(Debug)]
pub(crate) struct MockTransport {
    script: Script,
}

impl MockTransport {
    pub(crate) fn new(script: Script) -> Self {
        Self { script }
    }
}

impl Transport for MockTransport {
    type Error = io::Error;

    fn send(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let state = &self.script.0;
        if state.send_limit.get().is_some_and(|limit| state.sent.borrow().len() >= limit) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "send refused"));
        }
        state.sent.borrow_mut().push(data.to_vec());
        Ok(())
    }

    fn recv(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        let Some(reply) = self.script.0.replies.borrow_mut().pop_front() else {
            return Ok(0);
        };
        let len = buffer.len().min(reply.len());
        buffer[..len].copy_from_slice(&reply[..len]);
        Ok(len)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.script.0.closed.set(self.script.0.closed.get() + 1);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockConnector {
    script: Script,
}

impl MockConnector {
    pub(crate) fn new(script: Script) -> Self {
        Self { script }
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;
    type Error = io::Error;

    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<Self::Transport, Self::Error> {
        self.script.0.connects.borrow_mut().push((host.to_owned(), port, timeout));
        if self.script.0.refuse_connect.get() {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"));
        }
        Ok(MockTransport::new(self.script.clone()))
    }
}

/// Wraps an APDU as sent by server 1 to client 48.
pub(crate) fn frame(apdu: &[u8]) -> Vec<u8> {
    encode_frame(1, 48, apdu).unwrap()
}

pub(crate) fn plain_settings() -> CodecSettings {
    CodecSettings {
        client_address: 48,
        server_address: 1,
        authentication: Authentication::None,
        security: Security::None,
        interface_type: InterfaceType::Wrapper,
        password: Vec::new(),
        system_title: None,
        block_cipher_key: None,
        authentication_key: None,
        invocation_counter: 0,
        max_pdu_size: 0xFFFF,
    }
}

pub(crate) fn plain_codec() -> LnCodec {
    let mut codec = LnCodec::new();
    codec.initialize(&plain_settings()).unwrap();
    codec
}

#[rustfmt::skip]
pub(crate) fn aare_accepted() -> Vec<u8> {
    frame(&[
        0x61, 0x29,
        0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01,
        0xA2, 0x03, 0x02, 0x01, 0x00,
        0xA3, 0x05, 0xA1, 0x03, 0x02, 0x01, 0x00,
        0xBE, 0x10, 0x04, 0x0E,
        0x08, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x1E, 0x1D, 0x04, 0x00, 0x00, 0x07,
    ])
}

pub(crate) fn release_response() -> Vec<u8> {
    frame(&[0x63, 0x03, 0x80, 0x01, 0x00])
}

pub(crate) fn get_response(value: &TypedValue) -> Vec<u8> {
    let mut apdu = vec![0xC4, 0x01, 0xC1, 0x00];
    value.encode(&mut apdu);
    frame(&apdu)
}

pub(crate) fn get_error(code: u8) -> Vec<u8> {
    frame(&[0xC4, 0x01, 0xC1, 0x01, code])
}

pub(crate) fn set_response(status: u8) -> Vec<u8> {
    frame(&[0xC5, 0x01, 0xC1, status])
}

pub(crate) fn action_response(status: u8) -> Vec<u8> {
    frame(&[0xC7, 0x01, 0xC1, status, 0x00])
}
