//! # maildecode
//!
//! Decodes raw RFC 5322 email messages into their structured headers, text
//! and HTML bodies, attachments and embedded files.
//!
//! ## Features
//!
//! - **Headers**: RFC 2047 encoded words, addresses, dates and message ids
//! - **Multipart**: `mixed`, `alternative` and `related` trees
//! - **Transfer encodings**: 7bit, 8bit, binary, Base64, Quoted-Printable
//! - **Parameters**: quoted values and RFC 2231 continuations
//! - **Limits**: optional caps on message size and nesting depth
//!
//! ## Quick Start
//!
//! ```
//! let raw = "From: Ann <ann@example.com>\r\n\
//!            To: bob@example.com\r\n\
//!            Subject: =?utf-8?B?SMOpbGxv?=\r\n\
//!            Content-Type: text/plain; charset=utf-8\r\n\
//!            \r\n\
//!            Hello, World!\r\n";
//!
//! let message = maildecode::parse(raw.as_bytes())?;
//! assert_eq!(message.subject, "Héllo");
//! assert_eq!(message.from[0].address, "ann@example.com");
//! assert_eq!(message.text_body, "Hello, World!");
//! # Ok::<(), maildecode::Error>(())
//! ```
//!
//! ### Untrusted input
//!
//! ```
//! use maildecode::Config;
//!
//! let config = Config::builder()
//!     .max_message_size(25 * 1024 * 1024)
//!     .max_depth(16)
//!     .build();
//! let message = maildecode::parse_with_config(&b"Subject: hi\r\n\r\nbody"[..], &config)?;
//! assert_eq!(message.text_body, "body");
//! # Ok::<(), maildecode::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod classify;
mod config;
mod content_type;
mod date;
mod error;
mod fields;
mod header;
mod message;
mod walker;

pub mod encoding;
pub mod multipart;

use std::io::Read;

pub use address::{Address, parse_address, parse_address_list};
pub use classify::{PartClass, PartInfo, classify};
pub use config::{Config, ConfigBuilder};
pub use content_type::{ContentDisposition, ContentType};
pub use date::parse_date;
pub use error::{Error, Result, Stage};
pub use fields::{HeaderFields, PartialFields, parse_message_id_list, trim_message_id};
pub use header::{Headers, split_header_block};
pub use message::{Attachment, EmbeddedFile, Message};
pub use walker::MultipartKind;

/// Reads and parses a message without resource limits.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, otherwise the first parse
/// failure; see [`Message::parse`].
pub fn parse<R: Read>(reader: R) -> Result<Message> {
    parse_with_config(reader, &Config::default())
}

/// Reads and parses a message with the given limits.
///
/// With `max_message_size` set, at most one byte more than the limit is
/// read from `reader`.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, otherwise the first parse
/// failure; see [`Message::parse_with_config`].
pub fn parse_with_config<R: Read>(mut reader: R, config: &Config) -> Result<Message> {
    let mut raw = Vec::new();
    if let Some(limit) = config.max_message_size {
        let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
        reader.take(cap).read_to_end(&mut raw)?;
    } else {
        reader.read_to_end(&mut raw)?;
    }
    Message::parse_with_config(&raw, config)
}
