//! HTTP/1.1 wire handling for the verification scenario.
//!
//! This is deliberately not a general HTTP client: every exchange opens a
//! fresh connection, sends one fully-formed request with `Connection: close`,
//! and accumulates the response as raw bytes. The only structure the code
//! extracts from a response is the header/body boundary and the declared
//! `Content-Length`; all assertions run as literal substring checks over the
//! raw message.
//!
//! # Example
//!
//! ```no_run
//! use apicheck::http::{inspect, request, Transport};
//!
//! let transport = Transport::new();
//! let req = request::fetch_messages("localhost", None);
//! let raw = transport.exchange("localhost", 8080, &req).unwrap();
//! assert!(inspect::contains_status(raw.as_bytes(), "401 Unauthorized"));
//! ```

pub mod framer;
pub mod inspect;
pub mod request;
pub mod transport;

pub use framer::Framer;
pub use transport::{RawMessage, Transport};

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP exchange errors
///
/// Each variant corresponds to one observable failure of an exchange; the
/// scenario runner maps them to distinct process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not resolve hostname {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to send request: {0}")]
    Send(#[source] std::io::Error),

    #[error("error receiving response: {0}")]
    Receive(#[source] std::io::Error),

    #[error("connection closed before the response was complete")]
    ClosedEarly,

    #[error("timed out waiting for the peer")]
    Timeout,
}

/// CRLF line ending
pub const CRLF: &str = "\r\n";

/// Blank line separating the header block from the body
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Size of the per-read chunk buffer; independent of the message size
pub const RECV_CHUNK_SIZE: usize = 1024;

/// Default cap on the response accumulation buffer
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 65536;
