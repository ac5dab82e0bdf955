//! Reading message bodies from files.
//!
//! Accepts either a complete RFC 5322 message (optionally with an MBOX
//! `From ` line) or a bare plaintext body.

use mail_parser::{MessageParser, MimeHeaders};
use tracing::debug;

/// The parts of a message the PGP hooks look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBody {
    /// Top-level content type, `type/subtype`, lowercase.
    pub content_type: Option<String>,
    /// Charset declared for the text part.
    pub charset: Option<String>,
    pub text: String,
}

/// Parse `raw` as a message if it has headers, else as a plain body.
pub fn load_body(raw: &[u8]) -> MessageBody {
    let data = skip_from_line(raw);
    if !looks_like_message(data) {
        return MessageBody {
            text: String::from_utf8_lossy(data).into_owned(),
            ..MessageBody::default()
        };
    }

    let Some(msg) = MessageParser::default().parse(data) else {
        debug!("mail-parser rejected input, treating it as a plain body");
        return MessageBody {
            text: String::from_utf8_lossy(data).into_owned(),
            ..MessageBody::default()
        };
    };

    let content_type = MimeHeaders::content_type(msg.root_part()).map(|ct| match ct.subtype() {
        Some(sub) => format!("{}/{}", ct.ctype(), sub).to_ascii_lowercase(),
        None => ct.ctype().to_ascii_lowercase(),
    });
    let charset = msg
        .text_part(0)
        .and_then(|part| MimeHeaders::content_type(part))
        .and_then(|ct| ct.attribute("charset"))
        .map(str::to_string);
    let text = msg
        .body_text(0)
        .map(|s| s.into_owned())
        .unwrap_or_default();

    MessageBody {
        content_type,
        charset,
        text,
    }
}

fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

/// First line is a `Name: value` header.
fn looks_like_message(data: &[u8]) -> bool {
    let first = data.split(|&b| b == b'\n').next().unwrap_or_default();
    match first.iter().position(|&b| b == b':') {
        Some(colon) if colon > 0 => first[..colon]
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'-'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_body() {
        let body = load_body(b"Hi\n-----BEGIN PGP MESSAGE-----\n");
        assert_eq!(body.text, "Hi\n-----BEGIN PGP MESSAGE-----\n");
        assert_eq!(body.charset, None);
        assert_eq!(body.content_type, None);
    }

    #[test]
    fn test_message_with_charset() {
        let raw = b"From: a@example.com\r\n\
                    Subject: x\r\n\
                    Content-Type: text/plain; charset=ISO-8859-1\r\n\
                    \r\n\
                    caf\xe9\r\n";
        let body = load_body(raw);
        assert_eq!(body.content_type.as_deref(), Some("text/plain"));
        assert!(body
            .charset
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("iso-8859-1")));
        assert!(body.text.starts_with("caf\u{e9}"));
    }

    #[test]
    fn test_mbox_from_line_skipped() {
        let raw = b"From a@example.com Mon Jan  1 00:00:00 2024\nSubject: x\n\nbody\n";
        let body = load_body(raw);
        assert_eq!(body.text.trim_end(), "body");
    }

    #[test]
    fn test_armor_line_is_not_a_header() {
        assert!(!looks_like_message(b"-----BEGIN PGP MESSAGE-----\n"));
        assert!(!looks_like_message(b"Hello there: see below\n"));
        assert!(looks_like_message(b"Content-Type: text/plain\n"));
    }
}
