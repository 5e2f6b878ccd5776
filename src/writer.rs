//! HTTP response serialization
//!
//! [`ResponseWriter`] turns status lines, header blocks, and bodies into
//! wire bytes over any `std::io::Write` sink. Bodies can be written whole
//! (the caller supplies a matching `Content-Length` header) or chunk by
//! chunk with `Transfer-Encoding: chunked` framing.

use super::{headers::Headers, message::Status, Result, CRLF};
use std::io::Write;

/// Writer serializing one HTTP/1.1 response over a borrowed byte sink
///
/// The writer performs no buffering and never owns the sink; callers are
/// expected to emit a status line, then headers, then the body, in that
/// order.
pub struct ResponseWriter<'a> {
    sink: &'a mut dyn Write,
}

impl<'a> ResponseWriter<'a> {
    /// Create a writer over `sink`
    pub fn new(sink: &'a mut dyn Write) -> Self {
        ResponseWriter { sink }
    }

    /// Write `HTTP/1.1 <code> <reason>\r\n`.
    ///
    /// Reason phrases are fixed for 200, 400, and 500; any other code is
    /// emitted with 500's phrase.
    pub fn write_status_line(&mut self, status: Status) -> Result<()> {
        write!(
            self.sink,
            "HTTP/1.1 {} {}{}",
            status.code(),
            status.reason_phrase(),
            CRLF
        )?;
        Ok(())
    }

    /// Write every header as `name: value\r\n` followed by the empty line
    /// separating headers from the body
    pub fn write_headers(&mut self, headers: &Headers) -> Result<()> {
        self.sink.write_all(&headers.to_wire())?;
        self.sink.write_all(CRLF.as_bytes())?;
        Ok(())
    }

    /// Write raw body bytes; the caller is responsible for a matching
    /// `Content-Length` header
    pub fn write_body(&mut self, body: &[u8]) -> Result<usize> {
        self.sink.write_all(body)?;
        Ok(body.len())
    }

    /// Write one chunk as `<hex-size>\r\n<bytes>\r\n`.
    ///
    /// A single trailing `\n` is stripped before sizing: line-oriented
    /// feeders hand over lines whose newline is not part of the payload.
    /// Chunks that are empty after stripping are skipped entirely, since a
    /// zero-sized chunk is the body terminator.
    ///
    /// See also [`write_chunked_body_done`](Self::write_chunked_body_done).
    pub fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<usize> {
        let chunk = chunk.strip_suffix(b"\n").unwrap_or(chunk);
        if chunk.is_empty() {
            return Ok(0);
        }
        write!(self.sink, "{:x}{}", chunk.len(), CRLF)?;
        self.sink.write_all(chunk)?;
        self.sink.write_all(CRLF.as_bytes())?;
        Ok(chunk.len())
    }

    /// Write the `0\r\n\r\n` terminator ending a chunked body
    pub fn write_chunked_body_done(&mut self) -> Result<usize> {
        let terminator = b"0\r\n\r\n";
        self.sink.write_all(terminator)?;
        Ok(terminator.len())
    }

    /// Flush the underlying sink
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

/// Default response headers for a body of `content_len` bytes:
/// `Content-Length`, `Connection: close`, `Content-Type: text/html`
pub fn default_headers(content_len: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("Content-Length", content_len.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/html");
    headers
}
