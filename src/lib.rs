//! HTTP/1.1 message toolkit
//!
//! This crate reconstructs HTTP/1.1 requests and responses from arbitrary
//! byte streams and serializes them back. The parser is a pull-driven state
//! machine that accepts input in chunks of any size, so it works over TCP,
//! UDP datagrams, or in-memory test doubles alike. A small serving harness
//! drives the parser and a response writer over one connection at a time.
//!
//! # Architecture
//!
//! - [`Headers`] is a case-insensitive header container with RFC 9110 token
//!   validation and comma coalescing of repeated field names.
//! - [`MessageParser`] combines start-line, header, and body parsing into a
//!   [`Message`] (request or response), tolerating partial reads without
//!   backtracking.
//! - [`ResponseWriter`] serializes status lines, header blocks, and plain or
//!   chunked bodies over any `std::io::Write` sink.
//! - [`Server`] accepts connections, parses one request per connection, and
//!   hands a writer bound to the same stream to a user handler.
//!
//! # Examples
//!
//! ```no_run
//! use httpwire::{Request, ResponseWriter, Server, ServerOptions, Status};
//!
//! let server = Server::bind(ServerOptions::default()).unwrap();
//! server
//!     .serve(|w: &mut ResponseWriter<'_>, _req: &Request| {
//!         let body = b"<h1>hello</h1>";
//!         w.write_status_line(Status::OK).unwrap();
//!         w.write_headers(&httpwire::default_headers(body.len())).unwrap();
//!         w.write_body(body).unwrap();
//!     })
//!     .unwrap();
//! ```

pub mod client;
pub mod headers;
pub mod message;
pub mod parser;
pub mod server;
pub mod transport;
pub mod writer;

pub use client::HttpClient;
pub use headers::Headers;
pub use message::{Message, Request, RequestLine, Response, Status, StatusLine, Version};
pub use parser::{read_message, MessageParser};
pub use server::{Handler, Protocol, Server, ServerOptions};
pub use transport::{TcpTransport, TimedStream, Transport};
pub use writer::{default_headers, ResponseWriter};

/// Result type for all toolkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Toolkit errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty input")]
    EmptyInput,

    #[error("malformed start line: {0}")]
    Parse(String),

    #[error("invalid request method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid HTTP version: {0:?}")]
    InvalidVersion(String),

    #[error("invalid status code: {0:?}")]
    InvalidStatus(String),

    #[error("malformed header: {0}")]
    InvalidHeader(String),

    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),

    #[error("body exceeds declared content-length")]
    BodyOverflow,

    #[error("incomplete body")]
    IncompleteBody,

    #[error("stream ended before a complete message")]
    Incomplete,

    #[error("data received in done state")]
    DoneState,

    #[error("timeout")]
    Timeout,

    #[error("connection closed")]
    ConnectionClosed,
}

/// CRLF line terminator
pub const CRLF: &str = "\r\n";
