//! HTTP header handling
//!
//! This module provides a case-insensitive header container together with
//! the incremental field-line parser used while ingesting a message.

use super::{Error, Result, CRLF};
use std::collections::HashMap;
use std::fmt;

/// Find the next CRLF in a buffer
pub(crate) fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Check whether a byte is an RFC 9110 token character.
///
/// tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." /
///         "^" / "_" / "`" / "|" / "~" / DIGIT / ALPHA
fn is_tchar(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
            | b'`' | b'|' | b'~'
    ) || b.is_ascii_alphanumeric()
}

fn is_token(s: &[u8]) -> bool {
    !s.is_empty() && s.iter().all(|&b| is_tchar(b))
}

/// HTTP headers collection
///
/// Field names are matched case-insensitively and stored in canonical
/// lowercase form. Repeated names parsed from the wire are coalesced into a
/// single comma-separated value in arrival order (RFC 9110 §5.2); `set`
/// replaces any existing value outright. Iteration order is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    map: HashMap<String, String>,
}

impl Headers {
    /// Create a new empty headers collection
    pub fn new() -> Self {
        Headers { map: HashMap::new() }
    }

    /// Get the value for a header (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Set a header, replacing any existing value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.map.insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Remove a header (case-insensitive), returning its value if present
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.map.remove(&name.to_ascii_lowercase())
    }

    /// Check if a header exists
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&name.to_ascii_lowercase())
    }

    /// Get the number of headers
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if there are no headers
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all headers in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Consume zero or more complete field lines from `data`.
    ///
    /// Returns `(consumed, done)`. `done` becomes true when the empty line
    /// terminating the header block is reached; the terminating CRLF itself
    /// is *not* consumed — the message parser accounts for those two bytes.
    /// A return of `(0, false)` means no complete line is available yet.
    ///
    /// field-line = field-name ":" OWS field-value OWS
    ///
    /// The field-name must be a token with no surrounding whitespace; the
    /// value is trimmed of leading and trailing spaces and tabs. A name seen
    /// twice stores `<old>,<new>`.
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool)> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut consumed = 0;
        loop {
            let rest = &data[consumed..];
            let idx = match find_crlf(rest) {
                Some(idx) => idx,
                None => return Ok((consumed, false)),
            };
            if idx == 0 {
                return Ok((consumed, true));
            }

            self.parse_field_line(&rest[..idx])?;
            consumed += idx + CRLF.len();

            if consumed == data.len() {
                return Ok((consumed, false));
            }
        }
    }

    fn parse_field_line(&mut self, line: &[u8]) -> Result<()> {
        let colon = line.iter().position(|&b| b == b':').ok_or_else(|| {
            Error::InvalidHeader(format!("no colon in {:?}", String::from_utf8_lossy(line)))
        })?;

        let name = &line[..colon];
        if !is_token(name) {
            return Err(Error::InvalidHeader(format!(
                "invalid field name {:?}",
                String::from_utf8_lossy(name)
            )));
        }

        let name = String::from_utf8_lossy(name).to_ascii_lowercase();
        let value = String::from_utf8_lossy(&line[colon + 1..])
            .trim_matches(|c: char| c == ' ' || c == '\t')
            .to_string();

        match self.map.get_mut(&name) {
            Some(existing) => {
                existing.push(',');
                existing.push_str(&value);
            }
            None => {
                self.map.insert(name, value);
            }
        }
        Ok(())
    }

    /// Serialize all headers as `name: value` lines without the terminating
    /// empty line
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (name, value) in self.iter() {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(CRLF.as_bytes());
        }
        buf
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}
