//! Splice decrypted text back between the head and tail of a message.

use crate::i18n;
use crate::model::armor::ArmorBlock;

use super::charset::DEFAULT_CHARSET;

/// Default number of head lines after which the "shown partially" notice appears.
pub const OVER_LONG_HEAD_THRESHOLD: usize = 10;

/// Build the displayed body from the unprotected head/tail and the decrypted text.
///
/// When there is no head or tail the decrypted text is returned as is. Otherwise
/// it is framed by the localized begin/end markers, and a head with more than
/// `over_long_head_threshold` line breaks gets a notice that only part of the
/// message is protected.
pub fn reassemble(
    head: &str,
    decrypted: &str,
    tail: &str,
    over_long_head_threshold: usize,
) -> String {
    let framed = !head.is_empty() || !tail.is_empty();
    let mut out = String::with_capacity(head.len() + decrypted.len() + tail.len() + 256);

    if framed {
        if !head.is_empty() {
            if head.matches('\n').count() > over_long_head_threshold {
                out.push_str(i18n::note_part_encrypted());
                out.push_str("\n\n");
            }
            out.push_str(head);
            out.push_str("\n\n");
        }
        out.push_str(i18n::begin_pgp_part());
        out.push_str("\n\n");
    }

    out.push_str(decrypted);

    if framed {
        out.push_str("\n\n");
        out.push_str(i18n::end_pgp_part());
        out.push_str("\n\n");
        out.push_str(tail);
    }

    out
}

/// Charset for decoding the recovered plaintext.
///
/// A `Charset:` armor header wins over the charset of the surrounding message.
pub fn resolve_charset<'a>(armor: &'a ArmorBlock, ambient: Option<&'a str>) -> &'a str {
    armor
        .charset()
        .or(ambient.filter(|c| !c.trim().is_empty()))
        .unwrap_or(DEFAULT_CHARSET)
}
