//! Streaming transcoders: raw git output in, well-formed JSON out
//!
//! Each operation family owns a [`Transcoder`] that consumes subprocess
//! stdout chunks as the OS delivers them and appends transcoded bytes to an
//! output buffer. Chunk boundaries carry no meaning: a transcoder keeps just
//! enough trailing state (a few delimiter bytes, an incomplete UTF-8 tail, a
//! partial line) to guarantee that any chunking of the same byte stream
//! produces byte-identical total output.

pub mod diff;
pub mod escape;
pub mod log;
pub mod tree;

pub use diff::DiffTranscoder;
pub use log::LogTranscoder;
pub use tree::{TreeEntry, TreeTranscoder};

/// Receiver for transcoded output chunks.
///
/// The embedding layer (an HTTP response, a socket, a buffer) implements
/// this; operations push chunks in subprocess-delivery order and report the
/// single terminal outcome through their returned `Result`. Chunks sent
/// before a terminal error are not retracted.
pub trait ChunkSink {
    /// Deliver one chunk of output
    fn send(&mut self, chunk: &[u8]);
}

/// Collecting sink, mainly for callers that need the whole response
impl ChunkSink for Vec<u8> {
    fn send(&mut self, chunk: &[u8]) {
        self.extend_from_slice(chunk);
    }
}

/// Adapter turning a closure into a [`ChunkSink`]
pub struct SinkFn<F>(pub F);

impl<F: FnMut(&[u8])> ChunkSink for SinkFn<F> {
    fn send(&mut self, chunk: &[u8]) {
        (self.0)(chunk)
    }
}

/// Incremental converter from subprocess stdout bytes to response bytes.
///
/// `push` is called once per delivered chunk, `finish` exactly once when the
/// stream ends. A transcoder that has seen no input at all still emits its
/// wrapper once at `finish`, so an empty listing is distinguishable from an
/// operation that failed before producing output.
pub trait Transcoder {
    /// Consume one stdout chunk, appending any ready output to `out`
    fn push(&mut self, chunk: &[u8], out: &mut Vec<u8>);

    /// Flush trailing state and emit the closing sequence
    fn finish(&mut self, out: &mut Vec<u8>);
}

/// Verbatim passthrough for blob content: binary-safe, no wrapper
#[derive(Debug, Default)]
pub struct RawTranscoder;

impl Transcoder for RawTranscoder {
    fn push(&mut self, chunk: &[u8], out: &mut Vec<u8>) {
        out.extend_from_slice(chunk);
    }

    fn finish(&mut self, _out: &mut Vec<u8>) {}
}
