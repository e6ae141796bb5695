//! RFC 2046 multipart body splitting.
//!
//! A body is split on lines consisting of `--boundary` (the delimiter) or
//! `--boundary--` (the close delimiter), each optionally followed by
//! linear whitespace. The line break before a delimiter belongs to the
//! delimiter, not to the preceding part. Text before the first delimiter
//! (the preamble) and after the close delimiter (the epilogue) is ignored.

use crate::error::{Error, Result};
use crate::header::{Headers, split_header_block};

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart<'a> {
    /// The part's own headers.
    pub headers: Headers,
    /// Raw part content, still transfer-encoded.
    pub body: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Preamble,
    InPart,
    Done,
}

/// Iterator over the parts of a multipart body.
#[derive(Debug)]
pub struct Parts<'a> {
    body: &'a [u8],
    delimiter: Vec<u8>,
    pos: usize,
    state: State,
}

/// Splits `body` on `boundary`.
///
/// The iterator yields an error and stops if the body has no opening
/// delimiter or ends before the close delimiter.
#[must_use]
pub fn split_parts<'a>(body: &'a [u8], boundary: &str) -> Parts<'a> {
    let mut delimiter = Vec::with_capacity(boundary.len() + 2);
    delimiter.extend_from_slice(b"--");
    delimiter.extend_from_slice(boundary.as_bytes());
    Parts {
        body,
        delimiter,
        pos: 0,
        state: State::Preamble,
    }
}

/// A delimiter line found in the body.
struct Delimiter {
    line_start: usize,
    line_end: usize,
    close: bool,
}

impl Parts<'_> {
    /// Finds the next delimiter line at or after `from`, which must be the
    /// start of a line.
    fn next_delimiter(&self, from: usize) -> Option<Delimiter> {
        let mut start = from;
        while start < self.body.len() {
            let end = self.body[start..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(self.body.len(), |i| start + i + 1);
            if let Some(close) = self.match_delimiter(&self.body[start..end]) {
                return Some(Delimiter {
                    line_start: start,
                    line_end: end,
                    close,
                });
            }
            start = end;
        }
        None
    }

    /// Returns `Some(is_close)` if `line` is a delimiter line.
    fn match_delimiter(&self, line: &[u8]) -> Option<bool> {
        let rest = line.strip_prefix(self.delimiter.as_slice())?;
        let (rest, close) = match rest.strip_prefix(b"--") {
            Some(rest) => (rest, true),
            None => (rest, false),
        };
        rest.iter()
            .all(|&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
            .then_some(close)
    }
}

impl<'a> Iterator for Parts<'a> {
    type Item = Result<BodyPart<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Done => return None,
            State::Preamble => match self.next_delimiter(0) {
                None => {
                    self.state = State::Done;
                    return Some(Err(Error::Multipart(
                        "missing opening boundary delimiter".into(),
                    )));
                }
                Some(delimiter) if delimiter.close => {
                    self.state = State::Done;
                    return None;
                }
                Some(delimiter) => {
                    self.pos = delimiter.line_end;
                    self.state = State::InPart;
                }
            },
            State::InPart => {}
        }

        let content_start = self.pos;
        let Some(delimiter) = self.next_delimiter(content_start) else {
            self.state = State::Done;
            return Some(Err(Error::Multipart(
                "unexpected end of body before closing boundary".into(),
            )));
        };
        self.pos = delimiter.line_end;
        if delimiter.close {
            self.state = State::Done;
        }

        let body = self.body;
        let raw = strip_line_break(&body[content_start..delimiter.line_start]);
        Some(split_header_block(raw).map(|(headers, body)| BodyPart { headers, body }))
    }
}

/// Removes the line break that precedes a delimiter.
fn strip_line_break(content: &[u8]) -> &[u8] {
    content
        .strip_suffix(b"\r\n")
        .or_else(|| content.strip_suffix(b"\n"))
        .unwrap_or(content)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn collect<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<BodyPart<'a>>> {
        split_parts(body, boundary).collect()
    }

    #[test]
    fn test_two_parts_crlf() {
        let body = concat!(
            "This is the preamble.\r\n",
            "--XYZ\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "first\r\n",
            "--XYZ\r\n",
            "\r\n",
            "second\r\n",
            "--XYZ--\r\n",
            "epilogue\r\n"
        );
        let parts = collect(body.as_bytes(), "XYZ").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].headers.get("content-type"), Some("text/plain"));
        assert_eq!(parts[0].body, b"first");
        assert!(parts[1].headers.is_empty());
        assert_eq!(parts[1].body, b"second");
    }

    #[test]
    fn test_lf_and_trailing_whitespace() {
        let body = b"--b \n\nhello\n\n--b\t\n\nworld\n--b-- \n";
        let parts = collect(body, "b").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].body, b"hello\n");
        assert_eq!(parts[1].body, b"world");
    }

    #[test]
    fn test_boundary_prefix_is_content() {
        let body = b"--b\n\n--bc is not a delimiter\n--b--\n";
        let parts = collect(body, "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"--bc is not a delimiter");
    }

    #[test]
    fn test_close_without_final_newline() {
        let parts = collect(b"--b\n\nonly\n--b--", "b").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"only");
    }

    #[test]
    fn test_empty_multipart() {
        assert!(collect(b"--b--\n", "b").unwrap().is_empty());
    }

    #[test]
    fn test_missing_opening_delimiter() {
        assert!(matches!(
            collect(b"no delimiters here\n", "b"),
            Err(Error::Multipart(_))
        ));
    }

    #[test]
    fn test_missing_close_delimiter() {
        let mut parts = split_parts(b"--b\n\nfirst\n--b\n\nsecond\n", "b");
        assert_eq!(parts.next().unwrap().unwrap().body, b"first");
        assert!(matches!(parts.next(), Some(Err(Error::Multipart(_)))));
        assert!(parts.next().is_none());
    }

    #[test]
    fn test_malformed_part_headers() {
        assert!(matches!(
            collect(b"--b\nnot a header\n--b--\n", "b"),
            Err(Error::Header(_))
        ));
    }
}
