//! Recursive multipart traversal.
//!
//! The walker descends through `multipart/mixed`, `multipart/alternative`
//! and `multipart/related` containers, routing each leaf into the message
//! being assembled. Which containers may nest inside which is decided by
//! [`MultipartKind::can_contain`].

use std::borrow::Cow;
use std::fmt;

use tracing::{debug, trace};

use crate::classify::{PartClass, PartInfo, classify, content_id};
use crate::config::Config;
use crate::content_type::ContentType;
use crate::encoding::decode_transfer;
use crate::error::{Error, Result};
use crate::message::{Attachment, EmbeddedFile, Message};
use crate::multipart::split_parts;

/// The multipart containers the walker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MultipartKind {
    /// `multipart/mixed`: the outermost container, holds attachments.
    Mixed,
    /// `multipart/alternative`: several renderings of one body.
    Alternative,
    /// `multipart/related`: a body and the resources it references.
    Related,
}

impl MultipartKind {
    /// Maps a content type onto a walkable container kind.
    #[must_use]
    pub fn from_content_type(content_type: &ContentType) -> Option<Self> {
        if !content_type.is_multipart() {
            return None;
        }
        match content_type.sub_type.as_str() {
            "mixed" => Some(Self::Mixed),
            "alternative" => Some(Self::Alternative),
            "related" => Some(Self::Related),
            _ => None,
        }
    }

    /// Returns true if a container of this kind may hold `inner`.
    ///
    /// `mixed` is only valid at the top level, and a container never holds
    /// another of its own kind.
    #[must_use]
    pub const fn can_contain(self, inner: Self) -> bool {
        matches!(
            (self, inner),
            (Self::Mixed, Self::Alternative | Self::Related)
                | (Self::Alternative, Self::Related)
                | (Self::Related, Self::Alternative)
        )
    }
}

impl fmt::Display for MultipartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mixed => write!(f, "multipart/mixed"),
            Self::Alternative => write!(f, "multipart/alternative"),
            Self::Related => write!(f, "multipart/related"),
        }
    }
}

/// Walks a multipart tree into a [`Message`].
pub(crate) struct Walker<'a> {
    message: &'a mut Message,
    config: &'a Config,
}

impl<'a> Walker<'a> {
    pub(crate) const fn new(message: &'a mut Message, config: &'a Config) -> Self {
        Self { message, config }
    }

    /// Walks the parts of `body`, a container of type `content_type`.
    /// The top-level container is at depth 1.
    pub(crate) fn walk(
        &mut self,
        body: &[u8],
        content_type: &ContentType,
        kind: MultipartKind,
        depth: usize,
    ) -> Result<()> {
        if let Some(limit) = self.config.max_depth
            && depth > limit
        {
            return Err(Error::DepthLimitExceeded(limit));
        }
        let boundary = content_type
            .boundary()
            .filter(|b| !b.is_empty())
            .ok_or(Error::MissingBoundary)?;

        debug!(%kind, depth, boundary, "Walking multipart container");

        for part in split_parts(body, boundary) {
            let part = part?;
            let info = PartInfo::from_headers(&part.headers)?;
            let class = classify(&info, kind)?;
            trace!(content_type = %info.content_type.essence(), ?class, "Classified part");

            match class {
                PartClass::Multipart(inner) => {
                    self.walk(part.body, &info.content_type, inner, depth + 1)?;
                }
                PartClass::Attachment => {
                    let data = decode_transfer(part.body, info.transfer_encoding.as_deref())?;
                    self.message.attachments.push(Attachment {
                        filename: info.filename.clone().unwrap_or_default(),
                        content_type: info.content_type.essence(),
                        data,
                    });
                }
                PartClass::EmbeddedFile => {
                    let data = decode_transfer(part.body, info.transfer_encoding.as_deref())?;
                    self.message.embedded_files.push(EmbeddedFile {
                        content_id: content_id(&part.headers),
                        content_type: info.reported_content_type(),
                        data,
                    });
                }
                PartClass::TextBody => {
                    let fragment = body_fragment(part.body, info.transfer_encoding.as_deref())?;
                    self.message.push_text(fragment);
                }
                PartClass::HtmlBody => {
                    let fragment = body_fragment(part.body, info.transfer_encoding.as_deref())?;
                    self.message.push_html(fragment);
                }
            }
        }
        Ok(())
    }
}

/// Decodes a text body fragment and drops one trailing line break.
pub(crate) fn body_fragment(raw: &[u8], transfer_encoding: Option<&str>) -> Result<String> {
    let data = decode_transfer(raw, transfer_encoding)?;
    let text = match String::from_utf8_lossy(&data) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            debug!(len = data.len(), "Body fragment is not valid UTF-8, replaced invalid bytes");
            text
        }
    };
    Ok(trim_trailing_newline(text))
}

fn trim_trailing_newline(mut text: String) -> String {
    if text.ends_with("\r\n") {
        text.truncate(text.len() - 2);
    } else if text.ends_with('\n') {
        text.truncate(text.len() - 1);
    }
    text
}
