//! Recipient address handling (RFC 5322 §3.4).
//!
//! Keys are looked up by bare address, so every recipient passes through
//! [`strip_display_name`] before flag negotiation.

use serde::{Deserialize, Serialize};

/// A parsed email address.
///
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Parse a single address.
    ///
    /// Accepts `user@domain`, `<user@domain>`, `Name <user@domain>` and
    /// `"Quoted, Name" <user@domain>`. Anything else is kept verbatim as the
    /// address.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let (Some(open), Some(close)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
            if close > open {
                return Self {
                    display_name: unquote(&trimmed[..open]),
                    address: trimmed[open + 1..close].trim().to_string(),
                };
            }
        }

        Self {
            display_name: String::new(),
            address: trimmed.to_string(),
        }
    }

    /// Parse a comma-separated list, honouring commas inside quotes and angle brackets.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        split_list(raw)
            .into_iter()
            .map(Self::parse)
            .filter(|a| !a.address.is_empty())
            .collect()
    }
}

/// Reduce `"Name" <user@domain>` (or a list of them) to bare addresses joined by `", "`.
pub fn strip_display_name(raw: &str) -> String {
    EmailAddress::parse_list(raw)
        .into_iter()
        .map(|a| a.address)
        .collect::<Vec<_>>()
        .join(", ")
}

fn split_list(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut start = 0;

    for (i, ch) in raw.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}

fn unquote(s: &str) -> String {
    let trimmed = s.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}
