//! HTTP message types
//!
//! This module defines the request and response types produced by the
//! parser and consumed by the writer, plus the [`Message`] sum of the two.

use super::{headers::Headers, parser, Error, Result, CRLF};
use std::fmt;
use std::io::Read;

/// HTTP version
///
/// Only HTTP/1.1 is spoken; every other version token is rejected at parse
/// time, including HTTP/1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Version {
    #[default]
    Http11,
}

impl Version {
    /// Parse a full version token such as `HTTP/1.1`
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "HTTP/1.1" => Ok(Version::Http11),
            _ => Err(Error::InvalidVersion(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        "HTTP/1.1"
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP status code
///
/// Any code a peer declares is representable; reason phrases are fixed for
/// the codes the writer emits, and everything else borrows 500's phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(u16);

impl Status {
    pub const OK: Status = Status(200);
    pub const BAD_REQUEST: Status = Status(400);
    pub const INTERNAL_SERVER_ERROR: Status = Status(500);

    /// Create a status from a numeric code
    pub fn new(code: u16) -> Self {
        Status(code)
    }

    /// Get the numeric code
    pub fn code(&self) -> u16 {
        self.0
    }

    /// Get the reason phrase used when serializing this status
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            400 => "Bad Request",
            _ => "Internal Server Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// Request line: method, target, version
///
/// The method is a run of uppercase ASCII letters; the target is opaque
/// apart from containing no spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: String,
    target: String,
    version: Version,
}

impl RequestLine {
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        RequestLine {
            method: method.into(),
            target: target.into(),
            version: Version::Http11,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.target, self.version)
    }
}

/// Status line: version, status code, reason phrase
///
/// The reason phrase is everything after the second space, internal spaces
/// included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    version: Version,
    status: Status,
    reason: String,
}

impl StatusLine {
    pub fn new(status: Status, reason: impl Into<String>) -> Self {
        StatusLine {
            version: Version::Http11,
            status,
            reason: reason.into(),
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.version, self.status.code(), self.reason)
    }
}

/// HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    line: RequestLine,
    headers: Headers,
    content_length: usize,
    body: Vec<u8>,
}

impl Request {
    /// Create a new request with empty headers and no body
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Request::from_line(RequestLine::new(method, target))
    }

    pub(crate) fn from_line(line: RequestLine) -> Self {
        Request {
            line,
            headers: Headers::new(),
            content_length: 0,
            body: Vec::new(),
        }
    }

    /// Create a builder for constructing requests
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn request_line(&self) -> &RequestLine {
        &self.line
    }

    pub fn method(&self) -> &str {
        self.line.method()
    }

    pub fn target(&self) -> &str {
        self.line.target()
    }

    pub fn version(&self) -> Version {
        self.line.version()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Declared content length; 0 means no body
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub(crate) fn set_content_length(&mut self, n: usize) {
        self.content_length = n;
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Set the body, the declared length, and the `Content-Length` header
    /// to exactly `body.len()`
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.content_length = body.len();
        self.headers.set("Content-Length", body.len().to_string());
        self.body = body;
    }

    /// Append raw body bytes without touching headers
    pub fn append_body(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    /// Serialize the request to wire format
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.line.to_string().as_bytes());
        buf.extend_from_slice(CRLF.as_bytes());
        buf.extend_from_slice(&self.headers.to_wire());
        buf.extend_from_slice(CRLF.as_bytes());
        buf.extend_from_slice(&self.body);
        buf
    }
}

/// Builder for HTTP requests
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<String>,
    target: Option<String>,
    headers: Headers,
    body: Vec<u8>,
}

impl RequestBuilder {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Set the body; `Content-Length` is filled in at build time
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Request {
        let mut request = Request::new(
            self.method.unwrap_or_else(|| "GET".to_string()),
            self.target.unwrap_or_else(|| "/".to_string()),
        );
        request.headers = self.headers;
        if !self.body.is_empty() {
            request.set_body(self.body);
        }
        request
    }
}

/// HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    line: StatusLine,
    headers: Headers,
    content_length: usize,
    body: Vec<u8>,
}

impl Response {
    /// Create a new response with the canonical reason phrase for `status`
    pub fn new(status: Status) -> Self {
        Response::from_line(StatusLine::new(status, status.reason_phrase()))
    }

    pub(crate) fn from_line(line: StatusLine) -> Self {
        Response {
            line,
            headers: Headers::new(),
            content_length: 0,
            body: Vec::new(),
        }
    }

    /// Create a builder for constructing responses
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub fn status_line(&self) -> &StatusLine {
        &self.line
    }

    pub fn status(&self) -> Status {
        self.line.status()
    }

    pub fn reason(&self) -> &str {
        self.line.reason()
    }

    pub fn version(&self) -> Version {
        self.line.version()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Declared content length; 0 means no body
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub(crate) fn set_content_length(&mut self, n: usize) {
        self.content_length = n;
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Set the body, the declared length, and the `Content-Length` header
    /// to exactly `body.len()`
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.content_length = body.len();
        self.headers.set("Content-Length", body.len().to_string());
        self.body = body;
    }

    /// Append raw body bytes without touching headers
    pub fn append_body(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    /// Serialize the response to wire format
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.line.to_string().as_bytes());
        buf.extend_from_slice(CRLF.as_bytes());
        buf.extend_from_slice(&self.headers.to_wire());
        buf.extend_from_slice(CRLF.as_bytes());
        buf.extend_from_slice(&self.body);
        buf
    }
}

/// Builder for HTTP responses
#[derive(Debug)]
pub struct ResponseBuilder {
    status: Status,
    reason: Option<String>,
    headers: Headers,
    body: Vec<u8>,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        ResponseBuilder {
            status: Status::OK,
            reason: None,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }
}

impl ResponseBuilder {
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Set the body; `Content-Length` is filled in at build time
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Response {
        let reason = self
            .reason
            .unwrap_or_else(|| self.status.reason_phrase().to_string());
        let mut response = Response::from_line(StatusLine::new(self.status, reason));
        response.headers = self.headers;
        if !self.body.is_empty() {
            response.set_body(self.body);
        }
        response
    }
}

/// A parsed HTTP message: either a request or a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Message {
    /// Parse one complete message from a byte source
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Message> {
        parser::read_message(reader)
    }

    pub fn headers(&self) -> &Headers {
        match self {
            Message::Request(r) => r.headers(),
            Message::Response(r) => r.headers(),
        }
    }

    pub(crate) fn headers_mut(&mut self) -> &mut Headers {
        match self {
            Message::Request(r) => r.headers_mut(),
            Message::Response(r) => r.headers_mut(),
        }
    }

    pub fn content_length(&self) -> usize {
        match self {
            Message::Request(r) => r.content_length(),
            Message::Response(r) => r.content_length(),
        }
    }

    pub(crate) fn set_content_length(&mut self, n: usize) {
        match self {
            Message::Request(r) => r.set_content_length(n),
            Message::Response(r) => r.set_content_length(n),
        }
    }

    pub fn body(&self) -> &[u8] {
        match self {
            Message::Request(r) => r.body(),
            Message::Response(r) => r.body(),
        }
    }

    pub(crate) fn append_body(&mut self, data: &[u8]) {
        match self {
            Message::Request(r) => r.append_body(data),
            Message::Response(r) => r.append_body(data),
        }
    }

    /// Extract the request, if this message is one
    pub fn into_request(self) -> Option<Request> {
        match self {
            Message::Request(r) => Some(r),
            Message::Response(_) => None,
        }
    }

    /// Extract the response, if this message is one
    pub fn into_response(self) -> Option<Response> {
        match self {
            Message::Response(r) => Some(r),
            Message::Request(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_from_str() {
        assert_eq!(Version::from_str("HTTP/1.1").unwrap(), Version::Http11);
        assert!(Version::from_str("HTTP/1.0").is_err());
        assert!(Version::from_str("HTTP/2.0").is_err());
        assert!(Version::from_str("1.1").is_err());
    }

    #[test]
    fn test_status_reason_phrases() {
        assert_eq!(Status::OK.reason_phrase(), "OK");
        assert_eq!(Status::BAD_REQUEST.reason_phrase(), "Bad Request");
        assert_eq!(
            Status::INTERNAL_SERVER_ERROR.reason_phrase(),
            "Internal Server Error"
        );
        // Unmapped codes fall back to 500's phrase.
        assert_eq!(Status::new(418).reason_phrase(), "Internal Server Error");
    }

    #[test]
    fn test_set_body_sets_exact_content_length() {
        let mut request = Request::new("POST", "/submit");
        request.set_body(b"hello world!\n".to_vec());

        assert_eq!(request.content_length(), 13);
        assert_eq!(request.headers().get("content-length"), Some("13"));
        assert_eq!(request.body(), b"hello world!\n");
    }

    #[test]
    fn test_set_body_empty() {
        let mut response = Response::new(Status::OK);
        response.set_body(Vec::new());

        assert_eq!(response.content_length(), 0);
        assert_eq!(response.headers().get("content-length"), Some("0"));
    }

    #[test]
    fn test_append_body_leaves_headers_alone() {
        let mut request = Request::new("POST", "/");
        request.append_body(b"hel");
        request.append_body(b"lo");

        assert_eq!(request.body(), b"hello");
        assert_eq!(request.headers().get("content-length"), None);
    }

    #[test]
    fn test_request_to_wire() {
        let mut request = Request::new("POST", "/submit");
        request.set_body(b"hello".to_vec());

        let wire = String::from_utf8(request.to_wire()).unwrap();
        assert!(wire.starts_with("POST /submit HTTP/1.1\r\n"));
        assert!(wire.contains("content-length: 5\r\n"));
        assert!(wire.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_response_to_wire() {
        let response = Response::builder()
            .status(Status::BAD_REQUEST)
            .body(b"nope".to_vec())
            .build();

        let wire = String::from_utf8(response.to_wire()).unwrap();
        assert!(wire.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(wire.contains("content-length: 4\r\n"));
        assert!(wire.ends_with("\r\n\r\nnope"));
    }

    #[test]
    fn test_request_builder() {
        let request = Request::builder()
            .method("PUT")
            .target("/thing")
            .header("Host", "example.com")
            .body(b"data".to_vec())
            .build();

        assert_eq!(request.method(), "PUT");
        assert_eq!(request.target(), "/thing");
        assert_eq!(request.headers().get("host"), Some("example.com"));
        assert_eq!(request.content_length(), 4);
    }

    #[test]
    fn test_response_builder_custom_reason() {
        let response = Response::builder()
            .status(Status::new(400))
            .reason("BAD Request")
            .build();

        assert_eq!(response.status().code(), 400);
        assert_eq!(response.reason(), "BAD Request");
    }

    #[test]
    fn test_message_accessors() {
        let mut request = Request::new("GET", "/");
        request.headers_mut().set("Host", "a");
        let message = Message::Request(request);

        assert_eq!(message.headers().get("host"), Some("a"));
        assert_eq!(message.content_length(), 0);
        assert!(message.body().is_empty());
        assert!(message.into_request().is_some());
    }
}
