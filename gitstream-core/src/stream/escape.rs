//! JSON string escaping for streamed text
//!
//! Escapes control characters, backslashes, double quotes and all non-ASCII
//! code points (as `\uXXXX`, surrogate pairs for astral characters), so the
//! emitted stream is plain ASCII JSON regardless of what a commit message or
//! diff contains.

/// Append `text` to `out` escaped as JSON string content
pub fn escape_json_into(text: &str, out: &mut Vec<u8>) {
    escape_inner(text, None, out);
}

/// Like [`escape_json_into`], but emits a literal `"` for every occurrence
/// of `quote_token` instead of escaping it. Used by the record-log
/// transcoder, whose git format template marks structural quotes with a
/// control byte that must survive escaping.
pub(crate) fn escape_with_quote_token(text: &str, quote_token: char, out: &mut Vec<u8>) {
    escape_inner(text, Some(quote_token), out);
}

fn escape_inner(text: &str, quote_token: Option<char>, out: &mut Vec<u8>) {
    for c in text.chars() {
        if Some(c) == quote_token {
            out.push(b'"');
            continue;
        }
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{0C}' => out.extend_from_slice(b"\\f"),
            c if (c as u32) < 0x20 => push_unit(c as u16, out),
            c if c.is_ascii() => out.push(c as u8),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    push_unit(*unit, out);
                }
            }
        }
    }
}

fn push_unit(unit: u16, out: &mut Vec<u8>) {
    out.extend_from_slice(format!("\\u{:04x}", unit).as_bytes());
}

/// Length of an incomplete UTF-8 sequence at the end of `bytes`, if any.
///
/// Transcoders hold these bytes back so a multi-byte character split across
/// OS chunk boundaries is never decoded in halves.
pub(crate) fn incomplete_utf8_suffix(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let floor = len.saturating_sub(3);
    let mut i = len;
    while i > floor {
        i -= 1;
        let b = bytes[i];
        if b < 0x80 {
            return 0;
        }
        if b >= 0xC0 {
            let need = if b >= 0xF0 {
                4
            } else if b >= 0xE0 {
                3
            } else {
                2
            };
            return if len - i < need { len - i } else { 0 };
        }
        // continuation byte, keep scanning backwards
    }
    0
}
