//! Record-log transcoder: `git log` custom-format output to a JSON array
//!
//! The log is requested with a pretty-format template that contains no
//! literal double quote. Structural quotes are marked with the field-quote
//! byte and each record is terminated by the record-separator byte, both
//! injected through git's `%xNN` placeholders. The two delimiters are
//! non-printable control bytes git never emits in formatted log output, so
//! no collision with commit content is possible; everything else a commit
//! may contain (quotes, backslashes, braces, non-ASCII, control characters)
//! is escaped before the delimiters are rewritten into JSON structure.

use crate::stream::escape::{escape_with_quote_token, incomplete_utf8_suffix};
use crate::stream::Transcoder;

/// Structural quote marker inside the format template (ASCII unit separator)
pub(crate) const FIELD_QUOTE: u8 = 0x1F;

/// Record terminator inside the format template (ASCII record separator)
pub(crate) const RECORD_SEPARATOR: u8 = 0x1E;

/// Build the `--pretty=format:` template for one log invocation.
///
/// `%x1f` expands to [`FIELD_QUOTE`], `%x1e` to [`RECORD_SEPARATOR`]. Git
/// joins records with a newline, so the stream reads
/// `{record}\x1e\n{record}\x1e` and the 3-byte boundary
/// `\x1e \n {` marks exactly the seam between two sibling records.
pub(crate) fn log_format_template() -> String {
    const Q: &str = "%x1f";
    let fields = [
        ("hash", "%H"),
        ("parents", "%P"),
        ("author", "%an"),
        ("email", "%ae"),
        ("date", "%ad"),
        ("subject", "%s"),
        ("body", "%b"),
    ];
    let body = fields
        .iter()
        .map(|(key, placeholder)| format!("{Q}{key}{Q}:{Q}{placeholder}{Q}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{body}}}%x1e")
}

/// Streaming transcoder for commit history.
///
/// Holds back at most a partial record boundary (the record separator and a
/// following newline) plus an incomplete trailing UTF-8 sequence, so neither
/// is ever processed in halves.
#[derive(Debug, Default)]
pub struct LogTranscoder {
    carry: Vec<u8>,
    started: bool,
}

impl LogTranscoder {
    /// Create a transcoder with fresh stream state
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes at the end of `data` that must wait for the next chunk
    fn hold_back_len(data: &[u8]) -> usize {
        let n = data.len();
        let hold = if n >= 2 && data[n - 2] == RECORD_SEPARATOR && data[n - 1] == b'\n' {
            2
        } else if n >= 1 && data[n - 1] == RECORD_SEPARATOR {
            1
        } else {
            0
        };
        hold + incomplete_utf8_suffix(&data[..n - hold])
    }

    /// Transcode a prefix whose record boundaries are all complete
    fn transcode_into(head: &[u8], out: &mut Vec<u8>) {
        let mut collapsed = Vec::with_capacity(head.len());
        let mut i = 0;
        while i < head.len() {
            if head[i] == RECORD_SEPARATOR
                && i + 2 < head.len()
                && head[i + 1] == b'\n'
                && head[i + 2] == b'{'
            {
                // seam between two sibling records
                collapsed.extend_from_slice(b",{");
                i += 3;
            } else {
                collapsed.push(head[i]);
                i += 1;
            }
        }
        let text = String::from_utf8_lossy(&collapsed);
        escape_with_quote_token(&text, FIELD_QUOTE as char, out);
    }
}

impl Transcoder for LogTranscoder {
    fn push(&mut self, chunk: &[u8], out: &mut Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.carry.extend_from_slice(chunk);
        let hold = Self::hold_back_len(&self.carry);
        if self.carry.len() == hold {
            return;
        }
        let head: Vec<u8> = self.carry.drain(..self.carry.len() - hold).collect();
        if !self.started {
            out.push(b'[');
            self.started = true;
        }
        Self::transcode_into(&head, out);
    }

    fn finish(&mut self, out: &mut Vec<u8>) {
        let mut rest = std::mem::take(&mut self.carry);
        // the last record has no sibling: drop its terminator
        if rest.last() == Some(&b'\n') {
            rest.pop();
        }
        if rest.last() == Some(&RECORD_SEPARATOR) {
            rest.pop();
        }
        if !rest.is_empty() {
            if !self.started {
                out.push(b'[');
                self.started = true;
            }
            Self::transcode_into(&rest, out);
        }
        if !self.started {
            out.push(b'[');
            self.started = true;
        }
        out.push(b']');
    }
}
