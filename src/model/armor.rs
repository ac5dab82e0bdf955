//! Armored block types produced by the inline extractor.

use std::sync::OnceLock;

use regex::Regex;

/// Literal that opens every OpenPGP armor header line.
pub const BEGIN_MARKER: &str = "-----BEGIN PGP";
/// Literal that opens every OpenPGP armor tail line.
pub const END_MARKER: &str = "-----END PGP";

/// The block type named on the `-----BEGIN PGP <TYPE>-----` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmorKind {
    Message,
    SignedMessage,
    Signature,
    PublicKeyBlock,
    PrivateKeyBlock,
    Other(String),
}

impl ArmorKind {
    /// Parse the type from a BEGIN line (with its indentation already removed).
    pub fn from_begin_line(line: &str) -> Self {
        let label = line
            .trim()
            .trim_start_matches(BEGIN_MARKER)
            .trim_end_matches('-')
            .trim();
        match label {
            "MESSAGE" => Self::Message,
            "SIGNED MESSAGE" => Self::SignedMessage,
            "SIGNATURE" => Self::Signature,
            "PUBLIC KEY BLOCK" => Self::PublicKeyBlock,
            "PRIVATE KEY BLOCK" => Self::PrivateKeyBlock,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A contiguous armored block located inside a raw message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmorBlock {
    /// Byte offset of the start of the BEGIN line (indentation included).
    pub start_offset: usize,
    /// Byte offset just past the END line, line break excluded.
    pub end_offset: usize,
    /// Per-line prefix found before the BEGIN marker (e.g. `"> "`).
    pub indent: String,
    pub kind: ArmorKind,
    /// The block text with one level of `indent` removed from every line.
    pub body: String,
}

impl ArmorBlock {
    /// Value of a `Charset:` armor header, if the block carries one.
    pub fn charset(&self) -> Option<&str> {
        static CHARSET_RE: OnceLock<Regex> = OnceLock::new();
        let re = CHARSET_RE.get_or_init(|| {
            Regex::new(r"(?im)^Charset:[ \t]*(\S+)").expect("valid charset regex")
        });
        re.captures(&self.body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// A raw message body partitioned around its armored block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitText {
    /// Text before the block, trimmed of surrounding blank lines.
    pub head: String,
    pub armor: ArmorBlock,
    /// Text after the block, trimmed of surrounding blank lines.
    pub tail: String,
}
