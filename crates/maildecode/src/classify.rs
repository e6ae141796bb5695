//! Leaf part classification.

use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::decode_header_words;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::walker::MultipartKind;

/// What a part inside a multipart body turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartClass {
    /// A nested multipart container to descend into.
    Multipart(MultipartKind),
    /// A named file.
    Attachment,
    /// An inline resource, usually referenced by `Content-ID`.
    EmbeddedFile,
    /// A `text/plain` body fragment.
    TextBody,
    /// A `text/html` body fragment.
    HtmlBody,
}

/// The headers of a part that classification looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartInfo {
    /// Parsed `Content-Type`, `text/plain` when absent.
    pub content_type: ContentType,
    /// `Content-Type` exactly as it appeared.
    pub raw_content_type: Option<String>,
    /// `Content-Disposition` exactly as it appeared.
    pub disposition: Option<String>,
    /// Disposition type, lowercased, when `Content-Disposition` parses.
    pub disposition_kind: Option<String>,
    /// Filename from the disposition, else the content type's `name`.
    pub filename: Option<String>,
    /// `Content-Transfer-Encoding`.
    pub transfer_encoding: Option<String>,
}

impl PartInfo {
    /// Extracts classification inputs from part headers.
    ///
    /// A malformed `Content-Disposition` is treated as carrying no filename.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MediaType`] if `Content-Type` is present but malformed.
    pub fn from_headers(headers: &Headers) -> Result<Self> {
        let raw_content_type = headers
            .get("Content-Type")
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string);
        let content_type = match &raw_content_type {
            Some(value) => ContentType::parse(value)?,
            None => ContentType::text_plain(),
        };
        let disposition = headers.get("Content-Disposition").map(str::to_string);
        let parsed = disposition
            .as_deref()
            .and_then(|d| ContentDisposition::parse(d).ok());

        let filename = parsed
            .as_ref()
            .and_then(|d| d.filename().map(str::to_string))
            .or_else(|| content_type.name().map(str::to_string))
            .map(|name| decode_header_words(&name))
            .filter(|name| !name.is_empty());

        Ok(Self {
            content_type,
            raw_content_type,
            disposition,
            disposition_kind: parsed.map(|d| d.kind),
            filename,
            transfer_encoding: headers.get("Content-Transfer-Encoding").map(str::to_string),
        })
    }

    /// Returns true for an `attachment` disposition. A disposition that
    /// does not parse counts if its raw text mentions `attachment`.
    #[must_use]
    pub fn has_attachment_disposition(&self) -> bool {
        match (&self.disposition_kind, &self.disposition) {
            (Some(kind), _) => kind == "attachment",
            (None, Some(raw)) => raw.to_ascii_lowercase().contains("attachment"),
            (None, None) => false,
        }
    }

    /// The content type reported for embedded files: the header value as
    /// written, or `text/plain` when it was absent.
    #[must_use]
    pub fn reported_content_type(&self) -> String {
        self.raw_content_type
            .clone()
            .unwrap_or_else(|| self.content_type.essence())
    }
}

/// Classifies a part found inside a `kind` container.
///
/// Rules, first match wins:
///
/// 1. `multipart/{mixed,alternative,related}` descends if `kind` allows it.
/// 2. A part with a filename is an attachment (only under `mixed`).
/// 3. An `attachment` disposition or an `image/*` type is an embedded file.
/// 4. `text/plain` and `text/html` are body fragments.
///
/// # Errors
///
/// Returns [`Error::UnknownPartType`] for anything else.
pub fn classify(info: &PartInfo, kind: MultipartKind) -> Result<PartClass> {
    let unknown = || Error::UnknownPartType {
        content_type: info.content_type.essence(),
        kind,
    };

    if let Some(inner) = MultipartKind::from_content_type(&info.content_type) {
        return if kind.can_contain(inner) {
            Ok(PartClass::Multipart(inner))
        } else {
            Err(unknown())
        };
    }

    if info.filename.is_some() {
        return if kind == MultipartKind::Mixed {
            Ok(PartClass::Attachment)
        } else {
            Err(unknown())
        };
    }

    if info.has_attachment_disposition() || info.content_type.main_type == "image" {
        return Ok(PartClass::EmbeddedFile);
    }

    if info.content_type.is("text", "plain") {
        Ok(PartClass::TextBody)
    } else if info.content_type.is("text", "html") {
        Ok(PartClass::HtmlBody)
    } else {
        Err(unknown())
    }
}

/// Returns the `Content-ID` of a part without its angle brackets.
#[must_use]
pub fn content_id(headers: &Headers) -> String {
    decode_header_words(headers.get_or_empty("Content-ID"))
        .trim_matches(|c| c == '<' || c == '>')
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn info(pairs: &[(&str, &str)]) -> PartInfo {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            headers.add(*name, *value);
        }
        PartInfo::from_headers(&headers).unwrap()
    }

    #[test]
    fn test_missing_content_type_is_text() {
        let info = info(&[]);
        assert!(info.content_type.is("text", "plain"));
        assert_eq!(info.reported_content_type(), "text/plain");
        assert_eq!(
            classify(&info, MultipartKind::Alternative).unwrap(),
            PartClass::TextBody
        );
    }

    #[test]
    fn test_bodies() {
        let html = info(&[("Content-Type", "text/html; charset=utf-8")]);
        assert_eq!(
            classify(&html, MultipartKind::Related).unwrap(),
            PartClass::HtmlBody
        );
    }

    #[test]
    fn test_filename_sources() {
        let from_disposition = info(&[
            ("Content-Type", "application/pdf; name=\"ignored.pdf\""),
            ("Content-Disposition", "attachment; filename=\"report.pdf\""),
        ]);
        assert_eq!(from_disposition.filename.as_deref(), Some("report.pdf"));

        let from_name = info(&[(
            "Content-Type",
            "application/pdf; name=\"=?utf-8?Q?r=C3=A9sum=C3=A9.pdf?=\"",
        )]);
        assert_eq!(from_name.filename.as_deref(), Some("résumé.pdf"));

        let malformed = info(&[
            ("Content-Type", "application/pdf"),
            ("Content-Disposition", "attachment; filename"),
        ]);
        assert_eq!(malformed.filename, None);
        assert_eq!(malformed.disposition_kind, None);
        assert!(malformed.has_attachment_disposition());
    }

    #[test]
    fn test_disposition_kind() {
        let inline = info(&[
            ("Content-Type", "application/octet-stream"),
            ("Content-Disposition", "inline; x-note=attachment"),
        ]);
        assert_eq!(inline.disposition_kind.as_deref(), Some("inline"));
        assert!(!inline.has_attachment_disposition());
        assert!(classify(&inline, MultipartKind::Mixed).is_err());
    }

    #[test]
    fn test_named_image_is_attachment_under_mixed() {
        let part = info(&[
            ("Content-Type", "image/png; name=x.png"),
            ("Content-Disposition", "attachment; filename=x.png"),
        ]);
        assert_eq!(part.filename.as_deref(), Some("x.png"));
        assert_eq!(
            classify(&part, MultipartKind::Mixed).unwrap(),
            PartClass::Attachment
        );
        assert!(classify(&part, MultipartKind::Related).is_err());
    }

    #[test]
    fn test_attachment_only_under_mixed() {
        let part = info(&[
            ("Content-Type", "application/pdf"),
            ("Content-Disposition", "attachment; filename=a.pdf"),
        ]);
        assert_eq!(
            classify(&part, MultipartKind::Mixed).unwrap(),
            PartClass::Attachment
        );
        let err = classify(&part, MultipartKind::Related).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownPartType { kind: MultipartKind::Related, .. }
        ));
    }

    #[test]
    fn test_embedded_files() {
        let image = info(&[("Content-Type", "image/png"), ("Content-ID", "<logo>")]);
        for kind in [
            MultipartKind::Mixed,
            MultipartKind::Alternative,
            MultipartKind::Related,
        ] {
            assert_eq!(classify(&image, kind).unwrap(), PartClass::EmbeddedFile);
        }

        let disposition = info(&[
            ("Content-Type", "application/octet-stream"),
            ("Content-Disposition", "ATTACHMENT"),
        ]);
        assert_eq!(
            classify(&disposition, MultipartKind::Alternative).unwrap(),
            PartClass::EmbeddedFile
        );
    }

    #[test]
    fn test_nesting() {
        let related = info(&[("Content-Type", "multipart/related; boundary=r")]);
        assert_eq!(
            classify(&related, MultipartKind::Alternative).unwrap(),
            PartClass::Multipart(MultipartKind::Related)
        );
        assert!(classify(&related, MultipartKind::Related).is_err());

        let mixed = info(&[("Content-Type", "multipart/mixed; boundary=m")]);
        assert!(classify(&mixed, MultipartKind::Mixed).is_err());
    }

    #[test]
    fn test_unknown_part() {
        let zip = info(&[("Content-Type", "application/zip")]);
        let err = classify(&zip, MultipartKind::Alternative).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't process multipart/alternative inner mime type: application/zip"
        );
    }

    #[test]
    fn test_malformed_content_type() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text");
        assert!(matches!(
            PartInfo::from_headers(&headers),
            Err(Error::MediaType { .. })
        ));
    }

    #[test]
    fn test_content_id() {
        let mut headers = Headers::new();
        headers.add("Content-ID", "<part1.abc@example.com>");
        assert_eq!(content_id(&headers), "part1.abc@example.com");
        assert_eq!(content_id(&Headers::new()), "");
    }
}
