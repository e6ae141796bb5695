//! MIME transfer decoding and RFC 2047 header decoding.
//!
//! Supports the identity encodings, Base64 and Quoted-Printable for bodies,
//! and `B`/`Q` encoded words for header values.

use crate::content_type::is_token;
use crate::error::{Error, Result};
use base64::Engine;
use base64::alphabet::STANDARD;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use std::fmt;

/// Standard alphabet with required padding. Non-zero bits after the last
/// full byte are ignored.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Content-Transfer-Encoding of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// 7-bit ASCII (also used when the header is absent).
    #[default]
    SevenBit,
    /// 8-bit data.
    EightBit,
    /// Binary (no encoding).
    Binary,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Parses a `Content-Transfer-Encoding` value. Empty means 7bit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MediaType`] if the value is not a single token and
    /// [`Error::UnsupportedEncoding`] for tokens we cannot decode.
    pub fn parse(s: &str) -> Result<Self> {
        let value = s.trim();
        if value.is_empty() {
            return Ok(Self::SevenBit);
        }
        if !is_token(value) {
            return Err(Error::media_type(s, "transfer encoding is not a token"));
        }
        match value.to_ascii_lowercase().as_str() {
            "7bit" => Ok(Self::SevenBit),
            "8bit" => Ok(Self::EightBit),
            "binary" => Ok(Self::Binary),
            "base64" => Ok(Self::Base64),
            "quoted-printable" => Ok(Self::QuotedPrintable),
            _ => Err(Error::UnsupportedEncoding(value.to_string())),
        }
    }

    /// Decodes a body according to this encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the content is not valid for the encoding.
    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(data.to_vec()),
            Self::Base64 => decode_base64(data),
            Self::QuotedPrintable => decode_quoted_printable(data),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Binary => write!(f, "binary"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

/// Decodes `data` per the named transfer encoding (`None` means absent).
///
/// # Errors
///
/// See [`TransferEncoding::parse`] and [`TransferEncoding::decode`].
pub fn decode_transfer(data: &[u8], encoding: Option<&str>) -> Result<Vec<u8>> {
    TransferEncoding::parse(encoding.unwrap_or_default())?.decode(data)
}

/// Decodes Base64 body data, ignoring line breaks and other whitespace.
///
/// # Errors
///
/// Returns an error on invalid characters or padding.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    BASE64.decode(cleaned).map_err(|e| Error::Decode {
        encoding: TransferEncoding::Base64.to_string(),
        reason: e.to_string(),
    })
}

/// Decodes Quoted-Printable body data (RFC 2045).
///
/// Trailing whitespace on each line is discarded, a final `=` joins the
/// line with the next one, and hard line breaks are kept as they appear.
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());

    for (line_no, line) in data.split_inclusive(|&b| b == b'\n').enumerate() {
        let (content, ending) = if let Some(content) = line.strip_suffix(b"\r\n") {
            (content, &b"\r\n"[..])
        } else if let Some(content) = line.strip_suffix(b"\n") {
            (content, &b"\n"[..])
        } else {
            (line, &b""[..])
        };

        let content = trim_trailing_whitespace(content);
        let (content, soft_break) = match content.strip_suffix(b"=") {
            Some(content) => (content, true),
            None => (content, false),
        };

        let mut bytes = content.iter().copied();
        while let Some(byte) = bytes.next() {
            if byte != b'=' {
                result.push(byte);
                continue;
            }
            // Hex encoded byte
            let hex = [bytes.next(), bytes.next()];
            match hex {
                [Some(hi), Some(lo)] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                    result.push((hex_value(hi) << 4) | hex_value(lo));
                }
                _ => {
                    return Err(Error::Decode {
                        encoding: TransferEncoding::QuotedPrintable.to_string(),
                        reason: format!("invalid escape sequence on line {}", line_no + 1),
                    });
                }
            }
        }

        if !soft_break {
            result.extend_from_slice(ending);
        }
    }

    Ok(result)
}

fn trim_trailing_whitespace(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| b != b' ' && b != b'\t')
        .map_or(0, |i| i + 1);
    &line[..end]
}

const fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// Decodes a string that consists of exactly one RFC 2047 encoded word.
///
/// Format: `=?charset?encoding?encoded-text?=`
///
/// # Errors
///
/// Returns an error if `word` is not an encoded word, uses an unknown
/// encoding or charset, or its payload does not decode.
pub fn decode_encoded_word(word: &str) -> Result<String> {
    let invalid = |reason: &str| Error::Decode {
        encoding: "rfc2047".to_string(),
        reason: format!("{reason}: {word:?}"),
    };

    if word.len() < 8 || word.matches('?').count() != 4 {
        return Err(invalid("not an encoded word"));
    }
    let inner = word
        .strip_prefix("=?")
        .and_then(|w| w.strip_suffix("?="))
        .ok_or_else(|| invalid("not an encoded word"))?;

    let (charset, rest) = inner
        .split_once('?')
        .ok_or_else(|| invalid("missing charset"))?;
    let (encoding, text) = rest
        .split_once('?')
        .ok_or_else(|| invalid("missing encoding"))?;
    if charset.is_empty() {
        return Err(invalid("empty charset"));
    }

    let bytes = match encoding {
        "B" | "b" => BASE64
            .decode(text)
            .map_err(|_| invalid("invalid base64 payload"))?,
        "Q" | "q" => decode_q(text).ok_or_else(|| invalid("invalid Q payload"))?,
        _ => return Err(invalid("unknown encoding")),
    };

    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        "iso-8859-1" | "latin1" => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        "us-ascii" => Ok(bytes
            .iter()
            .map(|&b| if b.is_ascii() { char::from(b) } else { '\u{FFFD}' })
            .collect()),
        _ => Err(invalid("unhandled charset")),
    }
}

/// `Q` encoding: `_` is a space, `=XX` a hex byte, other printable ASCII
/// passes through.
fn decode_q(text: &str) -> Option<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' => {
                let hex = text.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 2;
            }
            b @ (b' '..=b'~' | b'\n' | b'\r' | b'\t') => out.push(b),
            _ => return None,
        }
        i += 1;
    }
    Some(out)
}

/// Decodes the encoded words of a header value.
///
/// The value is split on ASCII spaces and each word decoded on its own.
/// Decoded words are appended as-is; a word that is not a valid encoded
/// word is kept literally, preceded by a single space unless it is the
/// first word.
#[must_use]
pub fn decode_header_words(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    for (i, word) in value.split(' ').enumerate() {
        match decode_encoded_word(word) {
            Ok(text) => decoded.push_str(&text),
            Err(_) => {
                if i > 0 {
                    decoded.push(' ');
                }
                decoded.push_str(word);
            }
        }
    }
    decoded
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit").unwrap(), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("").unwrap(), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse(" Base64 ").unwrap(), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable").unwrap(),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("BINARY").unwrap(), TransferEncoding::Binary);
    }

    #[test]
    fn test_transfer_encoding_unsupported() {
        let err = TransferEncoding::parse("x-uuencode").unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding(ref e) if e == "x-uuencode"));
    }

    #[test]
    fn test_transfer_encoding_malformed() {
        let err = TransferEncoding::parse("base64; foo").unwrap_err();
        assert!(matches!(err, Error::MediaType { .. }));
    }

    #[test]
    fn test_identity_passthrough() {
        let data = b"caf\xc3\xa9 \xff\r\n";
        assert_eq!(decode_transfer(data, None).unwrap(), data);
        assert_eq!(decode_transfer(data, Some("8bit")).unwrap(), data);
    }

    #[test]
    fn test_base64_decode_with_line_breaks() {
        let decoded = decode_base64(b"SGVsbG8s\r\nIFdvcmxk\r\nIQ==\r\n").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_base64_decode_invalid() {
        let err = decode_base64(b"SGVsbG8*").unwrap_err();
        assert!(matches!(err, Error::Decode { ref encoding, .. } if encoding == "base64"));
        assert!(decode_base64(b"SGVsbG8").is_err());
    }

    #[test]
    fn test_base64_decode_non_zero_trailing_bits() {
        assert_eq!(decode_base64(b"aGl=").unwrap(), b"hi");
        assert_eq!(decode_base64(b"aR==").unwrap(), b"i");
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable(b"Hello, World!").unwrap(), b"Hello, World!");
        assert_eq!(decode_quoted_printable(b"H=C3=A9llo").unwrap(), "Héllo".as_bytes());
        assert_eq!(decode_quoted_printable(b"h=c3=a9").unwrap(), "hé".as_bytes());
        assert_eq!(decode_quoted_printable("raw é".as_bytes()).unwrap(), "raw é".as_bytes());
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=  \nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"keep  \nbreaks\r\n").unwrap(), b"keep\nbreaks\r\n");
        assert_eq!(decode_quoted_printable(b"trailing=").unwrap(), b"trailing");
    }

    #[test]
    fn test_quoted_printable_long_line() {
        let line = "a".repeat(200);
        assert_eq!(decode_quoted_printable(line.as_bytes()).unwrap(), line.as_bytes());
    }

    #[test]
    fn test_quoted_printable_invalid_escape() {
        let err = decode_quoted_printable(b"bad =ZZ escape").unwrap_err();
        assert!(matches!(
            err,
            Error::Decode { ref encoding, .. } if encoding == "quoted-printable"
        ));
        assert!(decode_quoted_printable(b"short =A").is_err());
    }

    #[test]
    fn test_encoded_word_base64() {
        assert_eq!(decode_encoded_word("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
        assert_eq!(decode_encoded_word("=?UTF-8?b?SMOpbGxv?=").unwrap(), "Héllo");
        assert_eq!(decode_encoded_word("=?utf-8?B?aGl=?=").unwrap(), "hi");
    }

    #[test]
    fn test_encoded_word_q() {
        assert_eq!(decode_encoded_word("=?utf-8?Q?H=C3=A9llo_there?=").unwrap(), "Héllo there");
        assert_eq!(decode_encoded_word("=?ISO-8859-1?q?caf=E9?=").unwrap(), "café");
    }

    #[test]
    fn test_encoded_word_us_ascii_replaces_high_bytes() {
        assert_eq!(decode_encoded_word("=?us-ascii?Q?a=FFb?=").unwrap(), "a\u{FFFD}b");
    }

    #[test]
    fn test_encoded_word_rejects() {
        for word in [
            "Hello",
            "=?utf-8?B?SMOpbGxv",
            "=?utf-8?X?abc?=",
            "=??B?SMOpbGxv?=",
            "=?koi8-r?B?SMOpbGxv?=",
            "=?utf-8?B?SMOpbGxv?=extra",
            "=?utf-8?B?not base64?=",
            "=?utf-8?Q?a?b?=",
        ] {
            assert!(decode_encoded_word(word).is_err(), "{word:?}");
        }
    }

    #[test]
    fn test_header_words_literal_passthrough() {
        assert_eq!(decode_header_words("Hello  World"), "Hello  World");
        assert_eq!(decode_header_words(""), "");
        assert_eq!(decode_header_words("=?bogus?= text"), "=?bogus?= text");
    }

    #[test]
    fn test_header_words_mixed() {
        assert_eq!(
            decode_header_words("=?UTF-8?B?SMOpbGxv?= =?UTF-8?Q?_w=C3=B6rld?="),
            "Héllo wörld"
        );
        assert_eq!(decode_header_words("Re: =?utf-8?B?SMOpbGxv?= again"), "Re:Héllo again");
    }
}
