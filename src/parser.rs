//! Incremental HTTP/1.1 message parsing
//!
//! The parser is pull-driven: callers feed it byte slices of arbitrary size
//! and it reports how much it consumed. Input it cannot make progress on is
//! left for the caller to re-present once more bytes have arrived, so
//! start-lines and header lines may straddle read boundaries freely.

use super::headers::find_crlf;
use super::message::{Message, Request, RequestLine, Response, Status, StatusLine, Version};
use super::{Error, Result, CRLF};
use std::io::{ErrorKind, Read};

const INITIAL_BUFFER_SIZE: usize = 1024;

/// Parse a request-line from the start of `data`.
///
/// request-line = method SP request-target SP HTTP-version
///
/// Returns `None` while no CRLF is available yet, otherwise the parsed line
/// and the number of bytes consumed including the CRLF. The method must be
/// uppercase ASCII letters and the version must be exactly `HTTP/1.1`.
pub fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    let idx = match find_crlf(data) {
        Some(idx) => idx,
        None => return Ok(None),
    };
    let consumed = idx + CRLF.len();
    let line = std::str::from_utf8(&data[..idx])
        .map_err(|_| Error::Parse("request line is not valid UTF-8".to_string()))?;

    let parts: Vec<&str> = line.split(' ').collect();
    if parts.len() != 3 {
        return Err(Error::Parse(format!(
            "expected 3 fields in request line, got {}",
            parts.len()
        )));
    }

    let method = parts[0];
    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(Error::InvalidMethod(method.to_string()));
    }
    Version::from_str(parts[2])?;

    Ok(Some((RequestLine::new(method, parts[1]), consumed)))
}

/// Parse a status-line from the start of `data`.
///
/// status-line = HTTP-version SP status-code SP reason-phrase
///
/// Same contract as [`parse_request_line`]. The reason phrase is everything
/// after the second space and may itself contain spaces.
pub fn parse_status_line(data: &[u8]) -> Result<Option<(StatusLine, usize)>> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    let idx = match find_crlf(data) {
        Some(idx) => idx,
        None => return Ok(None),
    };
    let consumed = idx + CRLF.len();
    let line = std::str::from_utf8(&data[..idx])
        .map_err(|_| Error::Parse("status line is not valid UTF-8".to_string()))?;

    let parts: Vec<&str> = line.splitn(3, ' ').collect();
    if parts.len() != 3 {
        return Err(Error::Parse(format!(
            "expected 3 fields in status line, got {}",
            parts.len()
        )));
    }

    Version::from_str(parts[0])?;
    let code: u16 = parts[1]
        .parse()
        .map_err(|_| Error::InvalidStatus(parts[1].to_string()))?;

    Ok(Some((StatusLine::new(Status::new(code), parts[2]), consumed)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Initial,
    Headers,
    Body,
    Done,
}

/// Incremental parser assembling one HTTP/1.1 message
///
/// A parser is single-use: create it, feed it with [`parse`](Self::parse)
/// until [`is_done`](Self::is_done), then take the message with
/// [`finish`](Self::finish). Whether a request or a response is being built
/// is decided by the first line and never changes afterwards.
#[derive(Debug)]
pub struct MessageParser {
    state: ParserState,
    message: Option<Message>,
    content_length: usize,
}

impl MessageParser {
    /// Create a parser waiting for the first start-line byte
    pub fn new() -> Self {
        MessageParser {
            state: ParserState::Initial,
            message: None,
            content_length: 0,
        }
    }

    /// Whether a complete message has been assembled
    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Consume as much of `data` as possible, crossing state boundaries
    /// within a single call when the input allows it.
    ///
    /// Returns the number of bytes consumed, which is `0` when the input is
    /// only a prefix of something parseable (need-more). Unconsumed bytes
    /// must be re-presented at the front of the next call.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.state == ParserState::Done {
            return Err(Error::DoneState);
        }

        let mut consumed = 0;
        while self.state != ParserState::Done && consumed < data.len() {
            let n = self.parse_single(&data[consumed..])?;
            if n == 0 {
                break;
            }
            consumed += n;
        }
        Ok(consumed)
    }

    /// Validate and yield the assembled message at end of input
    pub fn finish(self) -> Result<Message> {
        let message = match self.message {
            Some(message) => message,
            None => return Err(Error::Incomplete),
        };
        match self.state {
            ParserState::Done => {
                if message.body().len() != message.content_length() {
                    return Err(Error::IncompleteBody);
                }
                Ok(message)
            }
            ParserState::Body => Err(Error::IncompleteBody),
            _ => Err(Error::Incomplete),
        }
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize> {
        match self.state {
            ParserState::Initial => self.parse_start_line(data),
            ParserState::Headers => self.parse_header_block(data),
            ParserState::Body => self.parse_body(data),
            ParserState::Done => Err(Error::DoneState),
        }
    }

    fn parse_start_line(&mut self, data: &[u8]) -> Result<usize> {
        // The variant is decided by peeking at the complete first line:
        // a status-line starts with the version, a request-line never does.
        if find_crlf(data).is_none() {
            return Ok(0);
        }

        let consumed = if data.starts_with(b"HTTP/") {
            match parse_status_line(data)? {
                Some((line, n)) => {
                    self.message = Some(Message::Response(Response::from_line(line)));
                    n
                }
                None => return Ok(0),
            }
        } else {
            match parse_request_line(data)? {
                Some((line, n)) => {
                    self.message = Some(Message::Request(Request::from_line(line)));
                    n
                }
                None => return Ok(0),
            }
        };

        self.state = ParserState::Headers;
        Ok(consumed)
    }

    fn parse_header_block(&mut self, data: &[u8]) -> Result<usize> {
        let Some(message) = self.message.as_mut() else {
            return Err(Error::Parse("header block before start line".to_string()));
        };

        let (n, done) = message.headers_mut().parse(data)?;
        if !done {
            return Ok(n);
        }

        // Terminator reached: the header parser leaves its CRLF in place,
        // so account for those two bytes here.
        let consumed = n + CRLF.len();
        self.state = ParserState::Body;

        let declared = message.headers().get("content-length").map(str::to_string);
        match declared.as_deref() {
            None | Some("") => {
                // No declared body: the message ends at the header block and
                // whatever trails it in this chunk is dropped.
                self.state = ParserState::Done;
                Ok(data.len())
            }
            Some(value) => {
                let length: usize = value
                    .parse()
                    .map_err(|_| Error::InvalidContentLength(value.to_string()))?;
                self.content_length = length;
                message.set_content_length(length);
                if length == 0 {
                    self.state = ParserState::Done;
                }
                Ok(consumed)
            }
        }
    }

    fn parse_body(&mut self, data: &[u8]) -> Result<usize> {
        let Some(message) = self.message.as_mut() else {
            return Err(Error::Parse("body before start line".to_string()));
        };

        message.append_body(data);
        if message.body().len() > self.content_length {
            return Err(Error::BodyOverflow);
        }
        if message.body().len() == self.content_length {
            self.state = ParserState::Done;
        }
        Ok(data.len())
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one complete message from a byte source.
///
/// Bytes are pulled into a growable buffer (1024 bytes initially, doubled
/// whenever a read fills it) and offered to the parser; the consumed prefix
/// is compacted away after every call so partial lines survive until the
/// next read completes them. `Ok(0)` from the source is end-of-stream.
pub fn read_message<R: Read>(reader: &mut R) -> Result<Message> {
    let mut buf = vec![0u8; INITIAL_BUFFER_SIZE];
    let mut cursor = 0;
    let mut parser = MessageParser::new();

    while !parser.is_done() {
        let n = match reader.read(&mut buf[cursor..]) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        };
        if n == 0 {
            break;
        }
        cursor += n;
        if cursor == buf.len() {
            buf.resize(buf.len() * 2, 0);
        }

        let consumed = parser.parse(&buf[..cursor])?;
        if consumed > 0 {
            buf.copy_within(consumed..cursor, 0);
            cursor -= consumed;
        }
    }

    parser.finish()
}
