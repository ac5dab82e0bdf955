//! Line wrapping for clearsigned bodies.
//!
//! A clearsigned body is verified byte for byte, so it is wrapped before
//! signing rather than by the transport afterwards.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Conventional mail line width.
pub const DEFAULT_WRAP_WIDTH: usize = 72;

/// Wrap every line longer than `width` display columns at its last fitting space.
///
/// Words longer than `width` are left whole. Line breaks are normalized to `\n`.
/// A `width` of 0 disables wrapping.
pub fn simple_wrap(text: &str, width: usize) -> String {
    text.split('\n')
        .map(|line| wrap_line(line.trim_end_matches('\r'), width))
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_line(line: &str, width: usize) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut rest = line;

    while width > 0 && rest.width() > width {
        let Some(split) = break_point(rest, width) else {
            break;
        };
        out.push_str(&rest[..split]);
        out.push('\n');
        rest = &rest[split + 1..];
    }

    out.push_str(rest);
    out
}

/// Byte offset of the space at which `line` should be broken.
///
/// That is the last space within `width` columns or, when the first word alone
/// is too wide, the space right after it.
fn break_point(line: &str, width: usize) -> Option<usize> {
    let mut columns = 0;
    let mut last_space = None;

    for (i, ch) in line.char_indices() {
        if ch == ' ' && i > 0 {
            if columns > width {
                return Some(i);
            }
            last_space = Some(i);
        }
        columns += ch.width().unwrap_or(0);
        if columns > width && last_space.is_some() {
            break;
        }
    }

    last_space
}
