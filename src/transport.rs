//! Transport abstraction and timeout enforcement
//!
//! The parser and writer never block on their own; all blocking I/O and all
//! timeout handling happens here. [`TimedStream`] wraps a [`Transport`] and
//! polls for readiness before every read or write, and implements the std
//! I/O traits so the reader driver and the response writer run over it
//! unchanged.

use super::{Error, Result};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::fd::AsRawFd;
use std::time::Duration;

/// Default per-operation timeout for timed streams
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Readiness interest for [`Transport::ready`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Read,
    Write,
}

/// Operations a byte-stream transport must provide
///
/// Implementations exist for TCP; any transport delivering an ordered byte
/// stream fits.
pub trait Transport {
    /// Wait until the transport is ready for `interest`, or until `timeout`
    /// elapses. Returns false on timeout.
    fn ready(&self, interest: Interest, timeout: Option<Duration>) -> Result<bool>;

    /// Read bytes from the transport
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write bytes to the transport
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Close the transport
    fn close(&mut self) -> Result<()>;
}

/// Timeout-enforcing wrapper around a transport
pub struct TimedStream<T: Transport> {
    inner: T,
    timeout: Option<Duration>,
}

impl<T: Transport> TimedStream<T> {
    /// Wrap `inner` with the default timeout
    pub fn new(inner: T) -> Self {
        TimedStream {
            inner,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Set the per-operation timeout; `None` waits forever
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Read with the configured timeout
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.inner.ready(Interest::Read, self.timeout)? {
            return Err(Error::Timeout);
        }
        self.inner.read(buf)
    }

    /// Write with the configured timeout
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if !self.inner.ready(Interest::Write, self.timeout)? {
            return Err(Error::Timeout);
        }
        self.inner.write(buf)
    }

    /// Close the underlying transport
    pub fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl TimedStream<TcpTransport> {
    /// Wrap a TCP stream with the default timeout
    pub fn from_tcp(stream: TcpStream) -> Self {
        TimedStream::new(TcpTransport::new(stream))
    }
}

fn to_io_error(e: Error) -> io::Error {
    match e {
        Error::Io(e) => e,
        Error::Timeout => io::Error::new(io::ErrorKind::TimedOut, "transport timeout"),
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}

impl<T: Transport> Read for TimedStream<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        TimedStream::read(self, buf).map_err(to_io_error)
    }
}

impl<T: Transport> Write for TimedStream<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        TimedStream::write(self, buf).map_err(to_io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// TCP transport with poll-based readiness over the raw fd
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        TcpTransport { stream }
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }
}

impl Transport for TcpTransport {
    fn ready(&self, interest: Interest, timeout: Option<Duration>) -> Result<bool> {
        use libc::{poll, pollfd, POLLIN, POLLOUT};

        let mut pfd = pollfd {
            fd: self.stream.as_raw_fd(),
            events: match interest {
                Interest::Read => POLLIN,
                Interest::Write => POLLOUT,
            },
            revents: 0,
        };

        // -1 is poll's "wait forever"
        let timeout_ms = timeout.map(|d| d.as_millis() as i32).unwrap_or(-1);

        let result = unsafe { poll(&mut pfd as *mut pollfd, 1, timeout_ms) };
        if result < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        Ok(result > 0)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf).map_err(Error::from)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream.write(buf).map_err(Error::from)
    }

    fn close(&mut self) -> Result<()> {
        self.stream.shutdown(Shutdown::Both).map_err(Error::from)
    }
}
