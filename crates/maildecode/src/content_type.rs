//! MIME content type and disposition handling.
//!
//! Both headers share the RFC 2045 `value; key=value` grammar, so they are
//! parsed by the same routine. Parameter names are lowercased, quoted values
//! are unescaped, and RFC 2231 extended and continued parameters
//! (`filename*=utf-8''%E2%82%AC`, `name*0=...; name*1=...`) are reassembled.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx).
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// Creates a bare `text/plain` content type, the RFC 2045 default.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain")
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks the type and subtype.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type == main_type && self.sub_type == sub_type
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Returns the `name` parameter if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameters.get("name").map(String::as_str)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// # Errors
    ///
    /// Returns [`Error::MediaType`] if the value is not a valid media type.
    pub fn parse(s: &str) -> Result<Self> {
        let (main_type, sub_type, parameters) = parse_media_value(s, true)?;
        Ok(Self {
            main_type,
            sub_type: sub_type.unwrap_or_default(),
            parameters,
        })
    }
}

/// `Content-Disposition` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition type, lowercased (e.g., "inline", "attachment").
    pub kind: String,
    /// Parameters (e.g., filename).
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Parses a disposition string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MediaType`] if the value is malformed.
    pub fn parse(s: &str) -> Result<Self> {
        let (kind, sub_type, parameters) = parse_media_value(s, false)?;
        if sub_type.is_some() {
            return Err(Error::media_type(s, "unexpected subtype in disposition"));
        }
        Ok(Self { kind, parameters })
    }

    /// Returns the filename parameter if present.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameters.get("filename").map(String::as_str)
    }
}

const TSPECIALS: &[u8] = b"()<>@,;:\\\"/[]?=";

const fn is_token_byte(b: u8) -> bool {
    b > 0x20 && b < 0x7f && !is_tspecial(b)
}

const fn is_tspecial(b: u8) -> bool {
    let mut i = 0;
    while i < TSPECIALS.len() {
        if TSPECIALS[i] == b {
            return true;
        }
        i += 1;
    }
    false
}

/// Returns true if `s` is a single RFC 2045 token.
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_byte)
}

fn consume_token(s: &str) -> (&str, &str) {
    let end = s.bytes().position(|b| !is_token_byte(b)).unwrap_or(s.len());
    s.split_at(end)
}

/// Consumes a token or quoted-string, returning the unescaped value and
/// the remaining input.
fn consume_value(s: &str) -> Option<(String, &str)> {
    let Some(quoted) = s.strip_prefix('"') else {
        let (token, rest) = consume_token(s);
        return if token.is_empty() {
            None
        } else {
            Some((token.to_string(), rest))
        };
    };

    let mut value = String::new();
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((value, &quoted[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => return None,
            },
            '\r' | '\n' => return None,
            _ => value.push(c),
        }
    }
    None
}

/// Consumes `; key=value`, returning the lowercased key, the value and the
/// remaining input.
fn consume_param(s: &str) -> Option<(String, String, &str)> {
    let rest = s.trim_start().strip_prefix(';')?.trim_start();
    let (key, rest) = consume_token(rest);
    if key.is_empty() {
        return None;
    }
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let (value, rest) = consume_value(rest)?;
    Some((key.to_ascii_lowercase(), value, rest))
}

type MediaValue = (String, Option<String>, HashMap<String, String>);

fn parse_media_value(s: &str, require_subtype: bool) -> Result<MediaValue> {
    let (base, _) = s.split_once(';').unwrap_or((s, ""));
    let base = base.trim();

    let (main_type, rest) = consume_token(base);
    if main_type.is_empty() {
        return Err(Error::media_type(s, "no media type"));
    }
    let sub_type = if rest.is_empty() {
        if require_subtype {
            return Err(Error::media_type(s, "expected slash after first token"));
        }
        None
    } else {
        let rest = rest
            .strip_prefix('/')
            .ok_or_else(|| Error::media_type(s, "expected slash after first token"))?;
        let (sub_type, rest) = consume_token(rest);
        if sub_type.is_empty() {
            return Err(Error::media_type(s, "expected token after slash"));
        }
        if !rest.is_empty() {
            return Err(Error::media_type(s, "unexpected content after media subtype"));
        }
        Some(sub_type.to_ascii_lowercase())
    };

    let mut params = HashMap::new();
    let mut extended: HashMap<String, ExtendedParam> = HashMap::new();
    let mut remaining = &s[base_offset(s)..];

    loop {
        remaining = remaining.trim_start();
        if remaining.is_empty() {
            break;
        }
        let Some((key, value, rest)) = consume_param(remaining) else {
            if remaining.trim() == ";" {
                break;
            }
            return Err(Error::media_type(s, "invalid media parameter"));
        };
        remaining = rest;

        if let Some((name, section)) = key.split_once('*') {
            let (index, encoded) = match section.strip_suffix('*') {
                Some(index) => (index, true),
                None => (section, false),
            };
            if index.is_empty() {
                // key*=charset'lang'value
                let entry = extended.entry(name.to_string()).or_default();
                if entry.whole.replace(value).is_some() {
                    return Err(Error::media_type(s, "duplicate parameter name"));
                }
                continue;
            }
            if let Ok(index) = index.parse::<u32>() {
                let entry = extended.entry(name.to_string()).or_default();
                if entry.sections.insert(index, (encoded, value)).is_some() {
                    return Err(Error::media_type(s, "duplicate parameter name"));
                }
                continue;
            }
        }

        if params.insert(key, value).is_some() {
            return Err(Error::media_type(s, "duplicate parameter name"));
        }
    }

    for (name, param) in extended {
        if let Some(value) = param.join() {
            params.insert(name, value);
        }
    }

    Ok((main_type.to_ascii_lowercase(), sub_type, params))
}

/// Byte offset of the first `;` (the start of the parameter list).
fn base_offset(s: &str) -> usize {
    s.find(';').unwrap_or(s.len())
}

/// RFC 2231 pieces collected for one parameter name.
#[derive(Debug, Default)]
struct ExtendedParam {
    /// `key*` value.
    whole: Option<String>,
    /// `key*N` / `key*N*` sections, flagged when percent-encoded.
    sections: BTreeMap<u32, (bool, String)>,
}

impl ExtendedParam {
    /// A single `key*` value wins over numbered sections; numbered
    /// sections must be contiguous from zero.
    fn join(&self) -> Option<String> {
        if let Some(value) = &self.whole {
            return decode_rfc2231_value(value);
        }

        let mut joined = String::new();
        let mut found = false;
        for (expected, (index, (encoded, value))) in (0u32..).zip(&self.sections) {
            if *index != expected {
                break;
            }
            found = true;
            match (*encoded, expected) {
                (true, 0) => {
                    if let Some(decoded) = decode_rfc2231_value(value) {
                        joined.push_str(&decoded);
                    }
                }
                (true, _) => {
                    if let Some(bytes) = percent_decode(value) {
                        joined.push_str(&String::from_utf8_lossy(&bytes));
                    }
                }
                (false, _) => joined.push_str(value),
            }
        }
        found.then_some(joined)
    }
}

/// Decodes `charset'language'percent-encoded`.
fn decode_rfc2231_value(value: &str) -> Option<String> {
    let mut fields = value.splitn(3, '\'');
    let charset = fields.next()?.to_ascii_lowercase();
    let _language = fields.next()?;
    let encoded = fields.next()?;
    if charset != "us-ascii" && charset != "utf-8" {
        return None;
    }
    let bytes = percent_decode(encoded)?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn percent_decode(s: &str) -> Option<Vec<u8>> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
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
    fn test_content_type_new() {
        let ct = ContentType::new("text", "plain");
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert!(ct.parameters.is_empty());
    }

    #[test]
    fn test_text_plain_default_has_no_parameters() {
        let ct = ContentType::text_plain();
        assert!(ct.is("text", "plain"));
        assert_eq!(ct.parameters.get("charset").map(String::as_str), None);
    }

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("Text/Plain; Charset=utf-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.parameters.get("charset").map(String::as_str), Some("utf-8"));
        assert_eq!(ct.essence(), "text/plain");
    }

    #[test]
    fn test_content_type_parse_quoted() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part_123\"").unwrap();
        assert!(ct.is_multipart());
        assert_eq!(ct.sub_type, "mixed");
        assert_eq!(ct.boundary(), Some("----=_Part_123"));
    }

    #[test]
    fn test_content_type_quoted_escapes() {
        let ct = ContentType::parse(r#"image/png; name="a \"b\" c.png""#).unwrap();
        assert_eq!(ct.name(), Some(r#"a "b" c.png"#));
    }

    #[test]
    fn test_content_type_trailing_semicolon() {
        let ct = ContentType::parse("text/html; charset=us-ascii;").unwrap();
        assert_eq!(ct.parameters.get("charset").map(String::as_str), Some("us-ascii"));
    }

    #[test]
    fn test_content_type_rejects_malformed() {
        for value in [
            "",
            "text",
            "text/",
            "/plain",
            "text/plain garbage",
            "text/plain; charset",
            "text/plain; charset=\"unterminated",
            "text/plain; a=1; a=2",
        ] {
            let err = ContentType::parse(value).unwrap_err();
            assert!(
                matches!(err, Error::MediaType { .. }),
                "{value:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_rfc2231_extended_parameter() {
        let ct = ContentType::parse("application/pdf; name*=utf-8''%E2%82%AC%20rates.pdf").unwrap();
        assert_eq!(ct.name(), Some("€ rates.pdf"));
    }

    #[test]
    fn test_rfc2231_continuations() {
        let cd = ContentDisposition::parse(
            "attachment; filename*0*=us-ascii'en'This%20is; filename*1=\" long\"; filename*2=.txt",
        )
        .unwrap();
        assert_eq!(cd.kind, "attachment");
        assert_eq!(cd.filename(), Some("This is long.txt"));
    }

    #[test]
    fn test_disposition_bare() {
        let cd = ContentDisposition::parse("inline").unwrap();
        assert_eq!(cd.kind, "inline");
        assert_eq!(cd.filename(), None);
    }

    #[test]
    fn test_disposition_rejects_subtype() {
        assert!(ContentDisposition::parse("attachment/pdf").is_err());
    }

    #[test]
    fn test_is_token() {
        assert!(is_token("base64"));
        assert!(is_token("x-uuencode"));
        assert!(!is_token("base 64"));
        assert!(!is_token(""));
        assert!(!is_token("a;b"));
    }
}
