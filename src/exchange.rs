//! Request/response exchange pump.
//!
//! Drives the message sequence of one logical operation: each message is
//! sent, its reply is received and decoded, and only then is the next
//! message sent. The first failure aborts the sequence.

use std::io;

use crate::codec::{Codec, Reply};
use crate::error::{Error, Result};
use crate::trace::{Direction, log_packet};
use crate::transport::Transport;

const RECEIVE_BUFFER_LEN: usize = 4096;

pub struct Exchange<'a, T, K> {
    transport: &'a mut T,
    codec: &'a mut K,
    wire_trace: bool,
}

impl<'a, T: Transport, K: Codec> Exchange<'a, T, K> {
    pub fn new(transport: &'a mut T, codec: &'a mut K, wire_trace: bool) -> Self {
        Self { transport, codec, wire_trace }
    }

    /// Sends `messages` in order and returns one reply per message.
    ///
    /// Steps are numbered from 1. Data-block continuations are requested
    /// within the step that started the transfer. A reply with a non-zero
    /// status fails the step with [`Error::Rejected`].
    pub fn run(&mut self, messages: Vec<Vec<u8>>) -> Result<Vec<Reply>> {
        let mut replies = Vec::with_capacity(messages.len());

        for (index, message) in messages.into_iter().enumerate() {
            let step = index + 1;
            let mut reply = self.round_trip(step, &message)?;

            while reply.more_data {
                let next = self.codec.next_block_request().map_err(Error::Build)?;
                reply = self.round_trip(step, &next)?;
            }

            if reply.status != 0 {
                log::debug!("step {}: {} status {}", step, reply.command, reply.status);
                return Err(Error::Rejected { step, command: reply.command, status: reply.status });
            }

            replies.push(reply);
        }

        Ok(replies)
    }

    fn round_trip(&mut self, step: usize, message: &[u8]) -> Result<Reply> {
        if self.wire_trace {
            log_packet(Direction::Send, message);
        }
        self.transport.send(message).map_err(|err| Error::Send { step, source: err.into() })?;
        log::trace!("step {}: sent {} bytes", step, message.len());

        self.receive(step)
    }

    /// Receives until the codec has a complete reply.
    fn receive(&mut self, step: usize) -> Result<Reply> {
        let mut received = Vec::new();
        let mut buffer = [0u8; RECEIVE_BUFFER_LEN];

        loop {
            let len = self.transport.recv(&mut buffer).map_err(|err| Error::Receive { step, source: err.into() })?;
            if len == 0 {
                return Err(Error::Receive {
                    step,
                    source: Box::new(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by peer")),
                });
            }
            received.extend_from_slice(&buffer[..len]);

            let decoded = self.codec.decode(&received);
            if self.wire_trace && !matches!(decoded, Ok(None)) {
                log_packet(Direction::Receive, &received);
            }

            match decoded {
                Ok(Some(reply)) => {
                    log::trace!("step {}: received {} bytes", step, received.len());
                    return Ok(reply);
                }
                Ok(None) => continue,
                Err(source) => return Err(Error::Decode { step, source }),
            }
        }
    }
}
