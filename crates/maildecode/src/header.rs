//! MIME header handling.

use crate::encoding::decode_header_words;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Collection of email headers.
///
/// Names are case-insensitive; each name maps to its values in the order
/// they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        let value = value.into();
        self.headers.entry(name).or_default().push(value);
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets the first value for a header, or an empty string.
    #[must_use]
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get(&name.to_lowercase())
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns an iterator over all headers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Returns a copy with the RFC 2047 encoded words of every value decoded.
    #[must_use]
    pub fn decoded(&self) -> Self {
        let headers = self
            .headers
            .iter()
            .map(|(name, values)| {
                let values = values.iter().map(|v| decode_header_words(v)).collect();
                (name.clone(), values)
            })
            .collect();
        Self { headers }
    }
}

/// Splits raw bytes into the header block and the body that follows the
/// first empty line. Without an empty line everything is header and the
/// body is empty.
///
/// Continuation lines are joined to the previous value with a single space.
///
/// # Errors
///
/// Returns [`Error::Header`] on a field line without a colon, an invalid
/// field name, or a continuation line with nothing to continue.
pub fn split_header_block(raw: &[u8]) -> Result<(Headers, &[u8])> {
    let mut headers = Headers::new();
    let mut current: Option<(String, String)> = None;
    let mut offset = 0;

    while offset < raw.len() {
        let line_end = raw[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(raw.len(), |i| offset + i + 1);
        let line = trim_line_ending(&raw[offset..line_end]);
        offset = line_end;

        if line.is_empty() {
            break;
        }

        // Check for continuation line (starts with space or tab)
        if line[0] == b' ' || line[0] == b'\t' {
            let (_, value) = current
                .as_mut()
                .ok_or_else(|| Error::Header("continuation line before first field".into()))?;
            let continued = String::from_utf8_lossy(line);
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(continued.trim());
            continue;
        }

        if let Some((name, value)) = current.take() {
            headers.add(name, value);
        }

        let colon = line.iter().position(|&b| b == b':').ok_or_else(|| {
            Error::Header(format!(
                "malformed header line: {:?}",
                String::from_utf8_lossy(line)
            ))
        })?;
        let name = &line[..colon];
        if name.is_empty() || !name.iter().all(|&b| b.is_ascii_graphic()) {
            return Err(Error::Header(format!(
                "invalid header field name: {:?}",
                String::from_utf8_lossy(name)
            )));
        }
        let value = String::from_utf8_lossy(&line[colon + 1..]).trim().to_string();
        current = Some((String::from_utf8_lossy(name).into_owned(), value));
    }

    // Save last header
    if let Some((name, value)) = current {
        headers.add(name, value);
    }

    Ok((headers, &raw[offset..]))
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
        assert_eq!(headers.get_or_empty("Subject"), "");
    }

    #[test]
    fn test_headers_multiple_values() {
        let mut headers = Headers::new();
        headers.add("Received", "from a");
        headers.add("received", "from b");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Received"), Some("from a"));
        assert_eq!(headers.get_all("RECEIVED"), vec!["from a", "from b"]);
    }

    #[test]
    fn test_split_header_block_unfolds() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n"
        );

        let (headers, body) = split_header_block(text.as_bytes()).unwrap();
        assert!(body.is_empty());
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("To"), Some("recipient@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
    }

    #[test]
    fn test_split_header_block() {
        let raw = b"Subject: hi\nX-Folded: one\n\ttwo\n\nbody line\n\nmore\n";
        let (headers, body) = split_header_block(raw).unwrap();
        assert_eq!(headers.get("subject"), Some("hi"));
        assert_eq!(headers.get("x-folded"), Some("one two"));
        assert_eq!(body, b"body line\n\nmore\n");
    }

    #[test]
    fn test_split_without_blank_line() {
        let (headers, body) = split_header_block(b"Subject: only headers").unwrap();
        assert_eq!(headers.get("Subject"), Some("only headers"));
        assert!(body.is_empty());
    }

    #[test]
    fn test_split_empty_header_block() {
        let (headers, body) = split_header_block(b"\r\nbody").unwrap();
        assert!(headers.is_empty());
        assert_eq!(body, b"body");
    }

    #[test]
    fn test_split_rejects_malformed() {
        assert!(matches!(
            split_header_block(b"no colon here\n\nbody"),
            Err(Error::Header(_))
        ));
        assert!(matches!(
            split_header_block(b" leading continuation\n"),
            Err(Error::Header(_))
        ));
        assert!(matches!(
            split_header_block(b"Bad Name: x\n"),
            Err(Error::Header(_))
        ));
    }

    #[test]
    fn test_headers_decoded() {
        let mut headers = Headers::new();
        headers.add("Subject", "=?utf-8?B?SMOpbGxv?=");
        headers.add("X-Plain", "plain value");
        let decoded = headers.decoded();
        assert_eq!(decoded.get("subject"), Some("Héllo"));
        assert_eq!(decoded.get("x-plain"), Some("plain value"));
    }

    #[test]
    fn test_headers_iter() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com");
        headers.add("To", "recipient@example.com");

        let mut count = 0;
        for (name, value) in headers.iter() {
            assert!(!name.is_empty());
            assert!(!value.is_empty());
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
