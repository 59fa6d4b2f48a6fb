//! Tree-listing transcoder: `git ls-tree -l` lines to a JSON array
//!
//! Input lines have the shape `<mode> <type> <hash> <size>\t<name>`. Lines
//! are reassembled across chunk boundaries, parsed at the first tab, and
//! emitted as serialized [`TreeEntry`] records inside a single array.

use serde::{Deserialize, Serialize};

use crate::stream::Transcoder;

/// One entry of a tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path of the entry relative to the listed tree
    pub name: String,

    /// Object type: `blob`, `tree` or `commit` (submodule)
    #[serde(rename = "type")]
    pub entry_type: String,

    /// Byte size for blobs; `None` (JSON `null`) for trees and submodules
    pub size: Option<u64>,

    /// Object hash
    #[serde(rename = "objHash")]
    pub obj_hash: String,

    /// File mode as git prints it (e.g. `100644`)
    pub mode: String,
}

impl TreeEntry {
    /// Parse one `ls-tree -l` output line
    fn parse(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (meta, name) = line.split_once('\t')?;
        let mut fields = meta.split_whitespace();
        let mode = fields.next()?;
        let entry_type = fields.next()?;
        let obj_hash = fields.next()?;
        let size_raw = fields.next()?;
        let size = if size_raw == "-" {
            None
        } else {
            Some(size_raw.parse().ok()?)
        };
        Some(Self {
            name: name.to_string(),
            entry_type: entry_type.to_string(),
            size,
            obj_hash: obj_hash.to_string(),
            mode: mode.to_string(),
        })
    }
}

/// Streaming transcoder for tree listings.
///
/// Buffers at most one incomplete line between chunks.
#[derive(Debug, Default)]
pub struct TreeTranscoder {
    carry: Vec<u8>,
    started: bool,
    need_comma: bool,
}

impl TreeTranscoder {
    /// Create a transcoder with fresh stream state
    pub fn new() -> Self {
        Self::default()
    }

    fn emit_line(&mut self, line: &[u8], out: &mut Vec<u8>) {
        let text = String::from_utf8_lossy(line);
        if text.trim().is_empty() {
            return;
        }
        let Some(entry) = TreeEntry::parse(&text) else {
            tracing::warn!(line = %text, "skipping malformed ls-tree line");
            return;
        };
        match serde_json::to_vec(&entry) {
            Ok(json) => {
                if self.need_comma {
                    out.push(b',');
                }
                out.extend_from_slice(&json);
                self.need_comma = true;
            }
            Err(e) => tracing::warn!("failed to serialize tree entry: {}", e),
        }
    }
}

impl Transcoder for TreeTranscoder {
    fn push(&mut self, chunk: &[u8], out: &mut Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        if !self.started {
            out.push(b'[');
            self.started = true;
        }
        self.carry.extend_from_slice(chunk);
        while let Some(pos) = self.carry.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.carry.drain(..=pos).collect();
            self.emit_line(&line[..line.len() - 1], out);
        }
    }

    fn finish(&mut self, out: &mut Vec<u8>) {
        let rest = std::mem::take(&mut self.carry);
        if !rest.is_empty() {
            if !self.started {
                out.push(b'[');
                self.started = true;
            }
            // last line may arrive without a terminating newline
            self.emit_line(&rest, out);
        }
        if !self.started {
            self.started = true;
            out.push(b'[');
        }
        out.push(b']');
    }
}
