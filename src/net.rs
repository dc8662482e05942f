//! Connection setup and raw socket I/O
//!
//! One [`Conn`] is created per exchange and closed at its end; connections
//! are never reused. Reads and writes are guarded by `poll(2)` with an
//! optional deadline so a hung peer surfaces as a timeout instead of
//! blocking the run forever.

use crate::http::{Error, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::os::fd::AsRawFd;
use std::time::Duration;

/// Resolve `host` and open a TCP connection to it.
///
/// Resolution failures and connection failures are reported separately; the
/// first resolved address is used.
pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<Conn> {
    let mut addrs = (host, port).to_socket_addrs().map_err(|e| Error::Resolution {
        host: host.to_string(),
        source: e,
    })?;
    let addr = addrs.next().ok_or_else(|| Error::Resolution {
        host: host.to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
    })?;

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| Error::Connect {
            addr: addr.to_string(),
            source: e,
        })?;

    match timeout {
        Some(t) => socket.connect_timeout(&addr.into(), t),
        None => socket.connect(&addr.into()),
    }
    .map_err(|e| Error::Connect {
        addr: addr.to_string(),
        source: e,
    })?;

    Ok(Conn {
        stream: socket.into(),
        timeout,
    })
}

/// Poll events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollEvents {
    Read,
    Write,
}

/// Deadline in the form `poll(2)` takes: milliseconds, -1 for none.
///
/// Deadlines past `i32::MAX` milliseconds are clamped rather than cast; a
/// wrapping cast would turn a huge finite deadline into a negative value,
/// which poll reads as infinite.
fn poll_timeout_ms(timeout: Option<Duration>) -> i32 {
    timeout
        .map(|d| i32::try_from(d.as_millis()).unwrap_or(i32::MAX))
        .unwrap_or(-1)
}

/// One TCP connection, scoped to a single exchange.
#[derive(Debug)]
pub struct Conn {
    stream: TcpStream,
    timeout: Option<Duration>,
}

impl Conn {
    /// Wrap an already-connected stream. Used by tests to talk to stub
    /// peers without going through resolution.
    pub fn from_stream(stream: TcpStream, timeout: Option<Duration>) -> Self {
        Conn { stream, timeout }
    }

    fn poll(&self, events: PollEvents) -> io::Result<bool> {
        use libc::{poll, pollfd, POLLIN, POLLOUT};

        let mut pfd = pollfd {
            fd: self.stream.as_raw_fd(),
            events: match events {
                PollEvents::Read => POLLIN,
                PollEvents::Write => POLLOUT,
            },
            revents: 0,
        };

        let result = unsafe { poll(&mut pfd as *mut pollfd, 1, poll_timeout_ms(self.timeout)) };

        if result < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(result > 0)
    }

    /// Read once into `buf`, waiting at most the configured deadline.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.poll(PollEvents::Read)? {
            return Err(io::ErrorKind::TimedOut.into());
        }
        self.stream.read(buf)
    }

    /// Write once from `buf`, waiting at most the configured deadline.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.poll(PollEvents::Write)? {
            return Err(io::ErrorKind::TimedOut.into());
        }
        self.stream.write(buf)
    }

    /// Shut the connection down. Errors are ignored; the peer may already
    /// have closed its end.
    pub fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn connect_and_read() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"Hello").unwrap();
        });

        let mut conn = connect("127.0.0.1", addr.port(), Some(Duration::from_secs(1))).unwrap();
        let mut buf = [0u8; 5];
        let n = conn.read(&mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"Hello");
        conn.close();

        handle.join().unwrap();
    }

    #[test]
    fn read_deadline_expires() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept but never send anything.
        let _handle = thread::spawn(move || {
            let (_stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(2));
        });

        let mut conn =
            connect("127.0.0.1", addr.port(), Some(Duration::from_millis(100))).unwrap();
        let mut buf = [0u8; 10];
        let err = conn.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn poll_timeout_conversion() {
        assert_eq!(poll_timeout_ms(None), -1);
        assert_eq!(poll_timeout_ms(Some(Duration::from_millis(250))), 250);
        // Deadlines beyond what poll(2) can express clamp instead of
        // wrapping negative.
        assert_eq!(
            poll_timeout_ms(Some(Duration::from_secs(30 * 24 * 3600))),
            i32::MAX
        );
    }

    #[test]
    fn resolution_failure() {
        let err = connect("host.invalid.", 80, Some(Duration::from_secs(1))).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }
}
