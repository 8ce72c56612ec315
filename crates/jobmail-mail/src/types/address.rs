//! Email address types and recipient list helpers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mailbox: an email address with an optional display name.
///
/// Serializes as `{"email": ..., "name": ...}`, the shape the provider
/// expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Email address.
    pub email: String,
    /// Display name (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EmailAddress {
    /// Creates an address without a display name. The address is not validated.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Creates an address with a display name. An empty name is dropped.
    #[must_use]
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            email: email.into(),
            name: (!name.is_empty()).then_some(name),
        }
    }

    /// Parses `bare@email`, `<bare@email>`, `Name <bare@email>` or
    /// `"Name" <bare@email>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not one of the accepted forms or
    /// the address part is invalid.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();

        let (name, email) = match (text.find('<'), text.strip_suffix('>')) {
            (Some(open), Some(inner)) => {
                let name = text[..open].trim();
                let name = name
                    .strip_prefix('"')
                    .and_then(|n| n.strip_suffix('"'))
                    .unwrap_or(name)
                    .trim();
                (name, inner[open + 1..].trim())
            }
            (None, None) => ("", text),
            _ => return Err(Error::InvalidAddress(format!("Unbalanced brackets in {text}"))),
        };

        validate(email)?;
        Ok(Self::with_name(name, email))
    }
}

/// Basic validation: one `@`, non-empty local and domain parts, no
/// whitespace or mailbox punctuation.
fn validate(addr: &str) -> Result<()> {
    if addr.is_empty() {
        return Err(Error::InvalidAddress("Address cannot be empty".into()));
    }

    let Some((local, domain)) = addr.split_once('@') else {
        return Err(Error::InvalidAddress(format!("Address must contain @: {addr}")));
    };

    if domain.contains('@') {
        return Err(Error::InvalidAddress(format!(
            "Address must have exactly one @: {addr}"
        )));
    }

    if local.is_empty() || domain.is_empty() {
        return Err(Error::InvalidAddress(format!(
            "Local and domain parts cannot be empty: {addr}"
        )));
    }

    if addr
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | ','))
    {
        return Err(Error::InvalidAddress(format!(
            "Address contains invalid characters: {addr}"
        )));
    }

    Ok(())
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "\"{name}\" <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// Builds a single address from a display name and an email.
#[must_use]
pub fn format_address(name: &str, email: &str) -> EmailAddress {
    EmailAddress::with_name(name, email)
}

/// Parses a comma-separated recipient list.
///
/// Blank segments are skipped and exact duplicates removed, keeping the
/// first occurrence. Blank input yields an empty list. Splitting is done on
/// every comma, so display names must not contain one.
///
/// # Errors
///
/// Returns an error on the first malformed segment; nothing is returned
/// for the rest of the list.
pub fn parse_address_list(csv: &str) -> Result<Vec<EmailAddress>> {
    let mut addresses: Vec<EmailAddress> = Vec::new();

    for segment in csv.split(',').filter(|s| !s.trim().is_empty()) {
        let address = EmailAddress::parse(segment)?;
        if !addresses.contains(&address) {
            addresses.push(address);
        }
    }

    Ok(addresses)
}

/// Returns `name <email>` followed by the parsed `csv` list.
///
/// # Errors
///
/// Returns an error if `csv` contains a malformed segment.
pub fn address_list_with(name: &str, email: &str, csv: &str) -> Result<Vec<EmailAddress>> {
    let mut addresses = vec![format_address(name, email)];
    addresses.extend(parse_address_list(csv)?);
    Ok(addresses)
}

/// Builds a list from `(name, email)` pairs, skipping empty emails.
///
/// A missing name defaults to the email itself.
#[must_use]
pub fn address_list_from_pairs(pairs: &[(Option<&str>, &str)]) -> Vec<EmailAddress> {
    pairs
        .iter()
        .filter(|(_, email)| !email.is_empty())
        .map(|(name, email)| EmailAddress::with_name(name.unwrap_or(email), *email))
        .collect()
}

/// Renders one address for logs and previews.
#[must_use]
pub fn dump_address(address: &EmailAddress) -> String {
    address.to_string()
}

/// Renders an address list as `a, "B" <b@x>, ...`.
#[must_use]
pub fn dump_address_list(addresses: &[EmailAddress]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
