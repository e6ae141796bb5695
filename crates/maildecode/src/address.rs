//! RFC 5322 mailbox and address-list parsing.
//!
//! Syntax is handled by [`mailparse::addrparse`]. Groups are flattened into
//! their members and display names go through RFC 2047 decoding.

use crate::encoding::decode_header_words;
use crate::error::{Error, Result};
use mailparse::{MailAddr, SingleInfo, addrparse};
use std::fmt;

/// A single mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Address {
    /// Display name, empty when absent.
    pub name: String,
    /// `local@domain`.
    pub address: String,
}

impl Address {
    /// Creates a new address.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            return write!(f, "<{}>", self.address);
        }
        if self.name.contains(|c: char| "()<>[]:;@\\,.\"".contains(c)) {
            let escaped = self.name.replace('\\', "\\\\").replace('"', "\\\"");
            write!(f, "\"{escaped}\" <{}>", self.address)
        } else {
            write!(f, "{} <{}>", self.name, self.address)
        }
    }
}

/// Parses a header holding a single mailbox. Blank values yield `None`.
///
/// # Errors
///
/// Returns [`Error::AddressParse`] if the value is not exactly one mailbox.
pub fn parse_address(field: &str, value: &str) -> Result<Option<Address>> {
    let mut addresses = parse_address_list(field, value)?;
    match addresses.len() {
        0 if is_blank(value) => Ok(None),
        1 => Ok(addresses.pop()),
        n => Err(address_error(
            field,
            value,
            format!("expected a single mailbox, found {n}"),
        )),
    }
}

/// Parses a header holding an address list. Blank values yield an empty list.
///
/// # Errors
///
/// Returns [`Error::AddressParse`] on malformed syntax or a mailbox without
/// both a local part and a domain.
pub fn parse_address_list(field: &str, value: &str) -> Result<Vec<Address>> {
    if is_blank(value) {
        return Ok(Vec::new());
    }
    let list = addrparse(value).map_err(|e| address_error(field, value, e.to_string()))?;

    let mut addresses = Vec::new();
    for addr in list.iter() {
        match addr {
            MailAddr::Single(info) => addresses.push(mailbox(field, value, info)?),
            MailAddr::Group(group) => {
                for info in &group.addrs {
                    addresses.push(mailbox(field, value, info)?);
                }
            }
        }
    }
    Ok(addresses)
}

fn mailbox(field: &str, value: &str, info: &SingleInfo) -> Result<Address> {
    let valid = info
        .addr
        .rsplit_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(address_error(
            field,
            value,
            format!("invalid addr-spec {:?}", info.addr),
        ));
    }
    let name = info
        .display_name
        .as_deref()
        .map(decode_header_words)
        .unwrap_or_default();
    Ok(Address::new(name, info.addr.trim()))
}

fn is_blank(value: &str) -> bool {
    value.trim_matches(|c| c == ' ' || c == '\n' || c == '\r' || c == '\t').is_empty()
}

fn address_error(field: &str, value: &str, reason: String) -> Error {
    Error::AddressParse {
        field: field.to_string(),
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn list(value: &str) -> Vec<Address> {
        parse_address_list("To", value).unwrap()
    }

    #[test]
    fn test_blank_values() {
        assert!(list("").is_empty());
        assert!(list("  \n ").is_empty());
        assert_eq!(parse_address("Sender", " ").unwrap(), None);
    }

    #[test]
    fn test_bare_addr_spec() {
        assert_eq!(list("alice@example.com"), vec![Address::new("", "alice@example.com")]);
    }

    #[test]
    fn test_name_addr() {
        assert_eq!(
            list("Alice Liddell <alice@example.com>"),
            vec![Address::new("Alice Liddell", "alice@example.com")]
        );
        assert_eq!(
            list("\"Liddell, Alice\" <alice@example.com>"),
            vec![Address::new("Liddell, Alice", "alice@example.com")]
        );
    }

    #[test]
    fn test_list() {
        assert_eq!(
            list("alice@example.com, Bob <bob@example.com>"),
            vec![
                Address::new("", "alice@example.com"),
                Address::new("Bob", "bob@example.com"),
            ]
        );
    }

    #[test]
    fn test_groups_are_flattened() {
        let parsed = list("Friends: a@example.com, B <b@example.com>;");
        assert_eq!(
            parsed,
            vec![
                Address::new("", "a@example.com"),
                Address::new("B", "b@example.com"),
            ]
        );
        assert!(list("undisclosed-recipients:;").is_empty());
    }

    #[test]
    fn test_encoded_display_name() {
        assert_eq!(
            list("=?iso-8859-1?Q?Andr=E9?= <andre@example.com>"),
            vec![Address::new("André", "andre@example.com")]
        );
    }

    #[test]
    fn test_single_address() {
        let sender = parse_address("Sender", "Ann <ann@example.com>").unwrap();
        assert_eq!(sender, Some(Address::new("Ann", "ann@example.com")));
        let err = parse_address("Sender", "a@example.com, b@example.com").unwrap_err();
        assert!(matches!(err, Error::AddressParse { ref field, .. } if field == "Sender"));
        assert!(parse_address("Sender", "undisclosed-recipients:;").is_err());
    }

    #[test]
    fn test_malformed() {
        for value in ["no at sign", "Alice <alice@example.com", "alice@", "@example.com"] {
            let err = parse_address_list("Cc", value).unwrap_err();
            assert!(
                matches!(err, Error::AddressParse { ref field, .. } if field == "Cc"),
                "{value:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Address::new("", "a@example.com").to_string(), "<a@example.com>");
        assert_eq!(Address::new("Ann", "a@example.com").to_string(), "Ann <a@example.com>");
        assert_eq!(
            Address::new("Doe, J.", "j@example.com").to_string(),
            "\"Doe, J.\" <j@example.com>"
        );
    }
}
