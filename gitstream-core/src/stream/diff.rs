//! Diff transcoder: raw patch text as one escaped JSON string field
//!
//! The whole diff is a single opaque string value, so no structural
//! delimiters are needed; content is escaped chunk by chunk as it streams,
//! holding back only an incomplete trailing UTF-8 sequence.

use crate::stream::escape::{escape_json_into, incomplete_utf8_suffix};
use crate::stream::Transcoder;

const PREFIX: &[u8] = b"{\"diff\":\"";
const CLOSING: &[u8] = b"\"}";

/// Streaming transcoder for commit diffs
#[derive(Debug, Default)]
pub struct DiffTranscoder {
    carry: Vec<u8>,
    started: bool,
}

impl DiffTranscoder {
    /// Create a transcoder with fresh stream state
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transcoder for DiffTranscoder {
    fn push(&mut self, chunk: &[u8], out: &mut Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.carry.extend_from_slice(chunk);
        let hold = incomplete_utf8_suffix(&self.carry);
        if self.carry.len() == hold {
            return;
        }
        let head: Vec<u8> = self.carry.drain(..self.carry.len() - hold).collect();
        if !self.started {
            out.extend_from_slice(PREFIX);
            self.started = true;
        }
        escape_json_into(&String::from_utf8_lossy(&head), out);
    }

    fn finish(&mut self, out: &mut Vec<u8>) {
        let rest = std::mem::take(&mut self.carry);
        if !self.started {
            out.extend_from_slice(PREFIX);
            self.started = true;
        }
        if !rest.is_empty() {
            escape_json_into(&String::from_utf8_lossy(&rest), out);
        }
        out.extend_from_slice(CLOSING);
    }
}
