//! GitStream Core - git subprocess bridge with streaming JSON transcoding
//!
//! This crate exposes read/write operations on a directory of git
//! repositories (list, clone, delete, commit history, commit diff, tree
//! listing, blob content) by invoking the `git` command line tool and
//! incrementally transcoding its textual output into JSON while the
//! subprocess is still running. Nothing is buffered whole: callers receive
//! output as a sequence of chunks through a [`ChunkSink`], and exactly one
//! terminal outcome per operation through the returned `Result`.

pub mod config;
pub mod error;
pub mod process;
pub mod repo;
pub mod stream;

pub use config::Config;
pub use error::{Error, Result};
pub use repo::{GitRepo, Page, ReposDir};
pub use stream::ChunkSink;
