//! HTTP client
//!
//! A minimal client for the same message engine the server uses: requests
//! are serialized with [`Request::to_wire`] and responses come back through
//! the incremental parser, so both directions of the wire format are
//! exercised by the same code paths.

use super::transport::{TcpTransport, TimedStream};
use super::{parser::read_message, Error, Request, Response, Result};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// HTTP/1.1 client over a single TCP connection
pub struct HttpClient {
    stream: TimedStream<TcpTransport>,
}

impl HttpClient {
    /// Connect to a remote address
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Ok(HttpClient {
            stream: TimedStream::from_tcp(stream),
        })
    }

    /// Wrap an already-connected stream
    pub fn from_stream(stream: TcpStream) -> Self {
        HttpClient {
            stream: TimedStream::from_tcp(stream),
        }
    }

    /// Set the per-operation I/O timeout
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.stream.set_timeout(timeout);
    }

    /// Serialize and send a request in full
    pub fn send_request(&mut self, request: &Request) -> Result<()> {
        let wire = request.to_wire();
        let mut written = 0;

        while written < wire.len() {
            let n = self.stream.write(&wire[written..])?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            written += n;
        }
        Ok(())
    }

    /// Receive and parse one response
    pub fn receive_response(&mut self) -> Result<Response> {
        read_message(&mut self.stream)?
            .into_response()
            .ok_or_else(|| Error::Parse("request line where a response was expected".to_string()))
    }

    /// Send a GET request and wait for the response
    pub fn get(&mut self, target: &str) -> Result<Response> {
        let request = Request::builder()
            .method("GET")
            .target(target)
            .header("Host", "localhost")
            .build();

        self.send_request(&request)?;
        self.receive_response()
    }

    /// Send a POST request with a body and wait for the response
    pub fn post(&mut self, target: &str, body: Vec<u8>) -> Result<Response> {
        let request = Request::builder()
            .method("POST")
            .target(target)
            .header("Host", "localhost")
            .body(body)
            .build();

        self.send_request(&request)?;
        self.receive_response()
    }

    /// Close the connection
    pub fn close(&mut self) -> Result<()> {
        self.stream.close()
    }
}
