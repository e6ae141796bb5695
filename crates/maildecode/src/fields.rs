//! Structured header fields.
//!
//! Fields are parsed in a fixed order and parsing stops at the first
//! failure. Fields after the failing one keep their empty defaults.

use chrono::{DateTime, FixedOffset};

use crate::address::{Address, parse_address, parse_address_list};
use crate::date::parse_date;
use crate::encoding::decode_header_words;
use crate::error::{Error, Result};
use crate::header::Headers;

/// Decoded RFC 5322 header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
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
}

/// Fields parsed before a structured field failed.
///
/// Everything after the failing field is left empty, so the values here
/// are not reliable.
#[derive(Debug)]
pub struct PartialFields {
    /// Fields parsed so far.
    pub fields: HeaderFields,
    /// The first failure.
    pub error: Error,
}

impl HeaderFields {
    /// Parses the structured fields of a header map.
    ///
    /// # Errors
    ///
    /// Returns the partially populated fields together with the first
    /// address or date error.
    pub fn from_headers(headers: &Headers) -> std::result::Result<Self, PartialFields> {
        let mut fields = Self {
            subject: decode_header_words(headers.get_or_empty("Subject")),
            ..Self::default()
        };
        match fields.fill(headers) {
            Ok(()) => Ok(fields),
            Err(error) => Err(PartialFields { fields, error }),
        }
    }

    fn fill(&mut self, headers: &Headers) -> Result<()> {
        let list = |name: &str| parse_address_list(name, headers.get_or_empty(name));
        let single = |name: &str| parse_address(name, headers.get_or_empty(name));
        let date = |name: &str| parse_date(name, headers.get_or_empty(name));

        self.from = list("From")?;
        self.sender = single("Sender")?;
        self.reply_to = list("Reply-To")?;
        self.to = list("To")?;
        self.cc = list("Cc")?;
        self.bcc = list("Bcc")?;
        self.date = date("Date")?;
        self.resent_from = list("Resent-From")?;
        self.resent_sender = single("Resent-Sender")?;
        self.resent_to = list("Resent-To")?;
        self.resent_cc = list("Resent-Cc")?;
        self.resent_bcc = list("Resent-Bcc")?;
        self.resent_message_id =
            trim_message_id(headers.get_or_empty("Resent-Message-ID")).to_string();
        self.message_id = trim_message_id(headers.get_or_empty("Message-ID")).to_string();
        self.in_reply_to = parse_message_id_list(headers.get_or_empty("In-Reply-To"));
        self.references = parse_message_id_list(headers.get_or_empty("References"));
        self.resent_date = date("Resent-Date")?;
        Ok(())
    }
}

/// Strips surrounding angle brackets and spaces from a message id.
#[must_use]
pub fn trim_message_id(value: &str) -> &str {
    value.trim_matches(|c| c == '<' || c == '>' || c == ' ')
}

/// Splits a space-separated list of message ids.
#[must_use]
pub fn parse_message_id_list(value: &str) -> Vec<String> {
    value
        .split(' ')
        .filter(|token| !token.trim_matches(|c| c == ' ' || c == '\n').is_empty())
        .map(|token| trim_message_id(token).to_string())
        .collect()
}
