//! One-shot request/response exchange
//!
//! The transport owns the full lifecycle of a single exchange: connect,
//! send the complete request, accumulate the response chunk by chunk until
//! the framer reports completion, and close the connection on every exit
//! path. It carries no state between exchanges; the session credential
//! lives in the scenario layer.

use super::{framer::Framer, Error, Result, DEFAULT_MAX_RESPONSE_SIZE, RECV_CHUNK_SIZE};
use crate::net::{self, Conn};
use bytes::BytesMut;
use std::io;
use std::time::Duration;
use tracing::{trace, warn};

/// A raw response as accumulated from the wire, headers and body together.
///
/// `truncated` marks a response cut off by the accumulation cap; the prefix
/// that did arrive is handed back rather than discarded, and assertions that
/// depend on the missing tail fail on their own.
#[derive(Debug)]
pub struct RawMessage {
    bytes: BytesMut,
    truncated: bool,
}

impl RawMessage {
    pub(crate) fn new(bytes: BytesMut, truncated: bool) -> Self {
        RawMessage { bytes, truncated }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Exchange driver: connect, send, receive, close.
pub struct Transport {
    timeout: Option<Duration>,
    max_response_size: usize,
}

impl Transport {
    pub fn new() -> Self {
        Transport {
            timeout: Some(Duration::from_secs(10)),
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }

    /// Cap the response accumulation buffer.
    pub fn with_max_response_size(mut self, max: usize) -> Self {
        self.max_response_size = max;
        self
    }

    /// Deadline for connect and each read/write; `None` blocks forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one full exchange against `host:port`.
    ///
    /// `request` must be a complete, well-formed request. The connection is
    /// closed before this returns, on success and on every failure.
    pub fn exchange(&self, host: &str, port: u16, request: &[u8]) -> Result<RawMessage> {
        let mut conn = net::connect(host, port, self.timeout)?;
        let result = self.run(&mut conn, request);
        conn.close();
        result
    }

    fn run(&self, conn: &mut Conn, request: &[u8]) -> Result<RawMessage> {
        send_all(conn, request)?;
        receive(conn, self.max_response_size)
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the whole request, retrying short writes.
fn send_all(conn: &mut Conn, request: &[u8]) -> Result<()> {
    let mut written = 0;

    while written < request.len() {
        let n = conn.write(&request[written..]).map_err(send_error)?;
        if n == 0 {
            return Err(Error::Send(io::ErrorKind::WriteZero.into()));
        }
        written += n;
    }

    Ok(())
}

/// Accumulate the response until the framer reports completion.
///
/// Reads go through a fixed-size chunk buffer regardless of the message
/// size. A chunk that would push the accumulation past `max` is dropped and
/// the prefix is returned as truncated, so the returned bytes are always an
/// exact prefix of what an unbounded buffer would have held.
fn receive(conn: &mut Conn, max: usize) -> Result<RawMessage> {
    let mut framer = Framer::new();
    let mut acc = BytesMut::with_capacity(RECV_CHUNK_SIZE);
    let mut chunk = [0u8; RECV_CHUNK_SIZE];

    loop {
        let n = conn.read(&mut chunk).map_err(receive_error)?;

        if n == 0 {
            return Err(Error::ClosedEarly);
        }

        if acc.len() + n > max {
            warn!(
                received = acc.len(),
                max, "response buffer full, response may be truncated"
            );
            return Ok(RawMessage::new(acc, true));
        }

        acc.extend_from_slice(&chunk[..n]);
        trace!(chunk = n, total = acc.len(), "chunk received");

        if framer.check(&acc) {
            return Ok(RawMessage::new(acc, false));
        }
    }
}

fn send_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::TimedOut => Error::Timeout,
        _ => Error::Send(e),
    }
}

fn receive_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::TimedOut => Error::Timeout,
        _ => Error::Receive(e),
    }
}
