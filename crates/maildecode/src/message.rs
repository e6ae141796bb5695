//! Decoded message structure and assembly.

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::address::Address;
use crate::config::Config;
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::fields::HeaderFields;
use crate::header::{Headers, split_header_block};
use crate::walker::{MultipartKind, Walker, body_fragment};

/// A file attached to the message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attachment {
    /// Decoded filename.
    pub filename: String,
    /// Lowercase `type/subtype`, parameters stripped.
    pub content_type: String,
    /// Decoded content.
    pub data: Vec<u8>,
}

/// An inline resource such as an image referenced from the HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EmbeddedFile {
    /// `Content-ID` without angle brackets.
    pub content_id: String,
    /// Full `Content-Type` header value, parameters included.
    pub content_type: String,
    /// Decoded content.
    pub data: Vec<u8>,
}

/// A fully decoded email message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Message {
    /// All headers with encoded words decoded.
    pub headers: Headers,
    /// Decoded `Subject`.
    pub subject: String,
    /// `Sender`.
    pub sender: Option<Address>,
    /// `From`.
    pub from: Vec<Address>,
    /// `Reply-To`.
    pub reply_to: Vec<Address>,
    /// `To`.
    pub to: Vec<Address>,
    /// `Cc`.
    pub cc: Vec<Address>,
    /// `Bcc`.
    pub bcc: Vec<Address>,
    /// `Date`.
    pub date: Option<DateTime<FixedOffset>>,
    /// `Message-ID` without angle brackets.
    pub message_id: String,
    /// `In-Reply-To` message ids.
    pub in_reply_to: Vec<String>,
    /// `References` message ids.
    pub references: Vec<String>,
    /// `Resent-From`.
    pub resent_from: Vec<Address>,
    /// `Resent-Sender`.
    pub resent_sender: Option<Address>,
    /// `Resent-To`.
    pub resent_to: Vec<Address>,
    /// `Resent-Cc`.
    pub resent_cc: Vec<Address>,
    /// `Resent-Bcc`.
    pub resent_bcc: Vec<Address>,
    /// `Resent-Date`.
    pub resent_date: Option<DateTime<FixedOffset>>,
    /// `Resent-Message-ID` without angle brackets.
    pub resent_message_id: String,
    /// Concatenation of all plain text fragments.
    pub text_body: String,
    /// Concatenation of all HTML fragments.
    pub html_body: String,
    /// Plain text fragments in the order they were found.
    pub text_body_parts: Vec<String>,
    /// HTML fragments in the order they were found.
    pub html_body_parts: Vec<String>,
    /// Named files, in order.
    pub attachments: Vec<Attachment>,
    /// Inline resources, in order.
    pub embedded_files: Vec<EmbeddedFile>,
}

impl Message {
    /// Parses a raw RFC 5322 message without resource limits.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered; see [`Error`].
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_with_config(raw, &Config::default())
    }

    /// Parses a raw RFC 5322 message.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered; see [`Error`].
    pub fn parse_with_config(raw: &[u8], config: &Config) -> Result<Self> {
        if let Some(limit) = config.max_message_size
            && raw.len() > limit
        {
            return Err(Error::MessageTooLarge(limit));
        }

        if raw.is_empty() {
            return Err(Error::Header("empty message".into()));
        }

        let (headers, body) = split_header_block(raw)?;

        let fields = HeaderFields::from_headers(&headers).map_err(|partial| partial.error)?;
        let content_type = match headers.get("Content-Type").filter(|v| !v.trim().is_empty()) {
            Some(value) => ContentType::parse(value)?,
            None => ContentType::text_plain(),
        };
        debug!(
            size = raw.len(),
            content_type = %content_type.essence(),
            "Parsing message"
        );

        let mut message = Self::from_fields(headers.decoded(), fields);
        if let Some(kind) = MultipartKind::from_content_type(&content_type) {
            Walker::new(&mut message, config).walk(body, &content_type, kind, 1)?;
        } else if content_type.is("text", "plain") {
            let encoding = headers.get("Content-Transfer-Encoding");
            message.push_text(body_fragment(body, encoding)?);
        } else if content_type.is("text", "html") {
            let encoding = headers.get("Content-Transfer-Encoding");
            message.push_html(body_fragment(body, encoding)?);
        } else {
            return Err(Error::UnknownTopLevelType(content_type.essence()));
        }

        debug!(
            text_parts = message.text_body_parts.len(),
            html_parts = message.html_body_parts.len(),
            attachments = message.attachments.len(),
            embedded_files = message.embedded_files.len(),
            "Parsed message"
        );
        Ok(message)
    }

    fn from_fields(headers: Headers, fields: HeaderFields) -> Self {
        let HeaderFields {
            subject,
            sender,
            from,
            reply_to,
            to,
            cc,
            bcc,
            date,
            message_id,
            in_reply_to,
            references,
            resent_from,
            resent_sender,
            resent_to,
            resent_cc,
            resent_bcc,
            resent_date,
            resent_message_id,
        } = fields;
        Self {
            headers,
            subject,
            sender,
            from,
            reply_to,
            to,
            cc,
            bcc,
            date,
            message_id,
            in_reply_to,
            references,
            resent_from,
            resent_sender,
            resent_to,
            resent_cc,
            resent_bcc,
            resent_date,
            resent_message_id,
            ..Self::default()
        }
    }

    pub(crate) fn push_text(&mut self, fragment: String) {
        self.text_body.push_str(&fragment);
        self.text_body_parts.push(fragment);
    }

    pub(crate) fn push_html(&mut self, fragment: String) {
        self.html_body.push_str(&fragment);
        self.html_body_parts.push(fragment);
    }
}
