//! Locate the armored PGP block inside a plaintext body.
//!
//! The scan is line oriented: the BEGIN line fixes the indentation, and the
//! first later line carrying that indentation followed by `-----END PGP`
//! closes the block. Only the first block in a body is considered.

use tracing::debug;

use crate::model::armor::{ArmorBlock, ArmorKind, SplitText, BEGIN_MARKER, END_MARKER};

/// Split `raw` into head, armored block and tail.
///
/// Returns `None` when the body holds no `-----BEGIN PGP` marker, which is the
/// normal case for unprotected mail, or when the block is never closed.
pub fn extract(raw: &str) -> Option<SplitText> {
    let marker_pos = raw.find(BEGIN_MARKER)?;
    let line_start = raw[..marker_pos].rfind('\n').map_or(0, |i| i + 1);
    let indent = &raw[line_start..marker_pos];

    let begin_line_end = raw[marker_pos..]
        .find('\n')
        .map_or(raw.len(), |i| marker_pos + i);

    let Some((content_end, after_end)) = find_end_line(raw, begin_line_end + 1, indent) else {
        debug!(offset = marker_pos, "PGP armor block has no END line");
        return None;
    };

    let armor = ArmorBlock {
        start_offset: line_start,
        end_offset: content_end,
        indent: indent.to_string(),
        kind: ArmorKind::from_begin_line(&raw[marker_pos..begin_line_end]),
        body: strip_indent(&raw[line_start..content_end], indent),
    };

    debug!(
        start = armor.start_offset,
        end = armor.end_offset,
        indent = %armor.indent,
        kind = ?armor.kind,
        "Found inline PGP block"
    );

    Some(SplitText {
        head: raw[..line_start].trim().to_string(),
        armor,
        tail: raw[after_end..].trim().to_string(),
    })
}

/// Find the END line at or after `from`.
///
/// Returns the offset where the END line's content stops (line break
/// excluded) and the offset where the following text starts.
fn find_end_line(raw: &str, from: usize, indent: &str) -> Option<(usize, usize)> {
    let mut pos = from;
    while pos < raw.len() {
        let newline = raw[pos..].find('\n').map(|i| pos + i);
        let line = raw[pos..newline.unwrap_or(raw.len())].trim_end_matches('\r');

        if line
            .strip_prefix(indent)
            .is_some_and(|rest| rest.starts_with(END_MARKER))
        {
            return Some((pos + line.len(), newline.map_or(raw.len(), |i| i + 1)));
        }

        pos = newline? + 1;
    }
    None
}

/// Remove one leading `indent` from every line.
///
/// A quoted blank line often loses its trailing space (`"> "` becomes `">"`),
/// so a line equal to the right-trimmed indent is emptied as well.
fn strip_indent(block: &str, indent: &str) -> String {
    if indent.is_empty() {
        return block.to_string();
    }
    let bare = indent.trim_end();

    block
        .split_inclusive('\n')
        .map(|line| {
            if let Some(rest) = line.strip_prefix(indent) {
                rest
            } else if !bare.is_empty() && line.trim_end_matches(['\r', '\n']) == bare {
                &line[bare.len()..]
            } else {
                line
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "-----BEGIN PGP MESSAGE-----\n\nhQEMA5x2\n=Ab3d\n-----END PGP MESSAGE-----";

    #[test]
    fn test_no_marker_is_not_found() {
        assert!(extract("Hello,\n\njust plain text.\n").is_none());
        assert!(extract("").is_none());
    }

    #[test]
    fn test_head_block_tail() {
        let raw = format!("Hi there\n\n{BLOCK}\n\nBye\n");
        let split = extract(&raw).expect("block");
        assert_eq!(split.head, "Hi there");
        assert_eq!(split.tail, "Bye");
        assert_eq!(split.armor.body, BLOCK);
        assert_eq!(split.armor.kind, ArmorKind::Message);
        assert_eq!(&raw[split.armor.start_offset..split.armor.end_offset], BLOCK);
    }

    #[test]
    fn test_block_only() {
        let split = extract(BLOCK).expect("block");
        assert_eq!(split.head, "");
        assert_eq!(split.tail, "");
        assert_eq!(split.armor.start_offset, 0);
        assert_eq!(split.armor.end_offset, BLOCK.len());
    }

    #[test]
    fn test_end_line_without_trailing_newline() {
        let raw = format!("Head\n{BLOCK}");
        let split = extract(&raw).expect("block");
        assert_eq!(split.armor.body, BLOCK);
        assert_eq!(split.armor.end_offset, raw.len());
        assert_eq!(split.tail, "");
    }

    #[test]
    fn test_end_line_followed_by_single_newline() {
        let raw = format!("{BLOCK}\n");
        let split = extract(&raw).expect("block");
        assert_eq!(split.armor.body, BLOCK);
        assert_eq!(split.tail, "");
    }

    #[test]
    fn test_unterminated_block_is_not_found() {
        assert!(extract("Hi\n-----BEGIN PGP MESSAGE-----\n\nhQEMA5x2\n").is_none());
        assert!(extract("-----BEGIN PGP MESSAGE-----").is_none());
    }

    #[test]
    fn test_quoted_block_is_deindented() {
        let quoted: String = BLOCK.lines().map(|l| format!("> {l}\n")).collect();
        let raw = format!("On Monday you wrote:\n{quoted}\nThanks");
        let split = extract(&raw).expect("block");
        assert_eq!(split.armor.indent, "> ");
        assert_eq!(split.armor.body, BLOCK);
        assert_eq!(split.head, "On Monday you wrote:");
        assert_eq!(split.tail, "Thanks");
    }

    #[test]
    fn test_quoted_blank_line_without_trailing_space() {
        let raw = "> -----BEGIN PGP MESSAGE-----\n>\n> hQEMA5x2\n> -----END PGP MESSAGE-----\n";
        let split = extract(raw).expect("block");
        assert_eq!(
            split.armor.body,
            "-----BEGIN PGP MESSAGE-----\n\nhQEMA5x2\n-----END PGP MESSAGE-----"
        );
    }

    #[test]
    fn test_end_marker_must_carry_the_indent() {
        let raw = "  -----BEGIN PGP MESSAGE-----\n  abc\n-----END PGP MESSAGE-----\n  -----END PGP MESSAGE-----\ntail";
        let split = extract(raw).expect("block");
        assert_eq!(
            split.armor.body,
            "-----BEGIN PGP MESSAGE-----\nabc\n-----END PGP MESSAGE-----\n-----END PGP MESSAGE-----"
        );
        assert_eq!(split.tail, "tail");
    }

    #[test]
    fn test_crlf_line_endings() {
        let raw = "Hi\r\n\r\n-----BEGIN PGP MESSAGE-----\r\n\r\nhQEM\r\n-----END PGP MESSAGE-----\r\n\r\nBye\r\n";
        let split = extract(raw).expect("block");
        assert_eq!(split.head, "Hi");
        assert_eq!(split.tail, "Bye");
        assert_eq!(
            split.armor.body,
            "-----BEGIN PGP MESSAGE-----\r\n\r\nhQEM\r\n-----END PGP MESSAGE-----"
        );
    }

    #[test]
    fn test_clearsigned_block_runs_to_signature_end() {
        let signed = "-----BEGIN PGP SIGNED MESSAGE-----\nHash: SHA256\n\nhello\n-----BEGIN PGP SIGNATURE-----\n\niQEz\n-----END PGP SIGNATURE-----";
        let raw = format!("{signed}\n-- \nsig");
        let split = extract(&raw).expect("block");
        assert_eq!(split.armor.kind, ArmorKind::SignedMessage);
        assert_eq!(split.armor.body, signed);
        assert_eq!(split.tail, "-- \nsig");
    }

    #[test]
    fn test_only_first_block_is_taken() {
        let raw = format!("{BLOCK}\nmiddle\n{BLOCK}");
        let split = extract(&raw).expect("block");
        assert_eq!(split.armor.body, BLOCK);
        assert_eq!(split.tail, format!("middle\n{BLOCK}"));
    }
}
