//! Per-repository handle: command construction and streamed operations
//!
//! A handle binds a sanitized identifier to a verified repository directory
//! and is the working directory for every subprocess it launches. Handles
//! are request-scoped: construct, run one operation, drop. Each operation
//! owns an independent subprocess and transcoder, so concurrent invocations
//! never share state.

use std::path::{Path, PathBuf};

use crate::process::classify::{
    classify, Rule, BLOB_RULES, DIFF_RULES, LOG_RULES, TREE_RULES,
};
use crate::process::runner::{GitCommand, RunOutcome};
use crate::repo::dir::GIT_DATA_DIR;
use crate::repo::sanitize::sanitize_repository_id;
use crate::stream::log::log_format_template;
use crate::stream::{
    ChunkSink, DiffTranscoder, LogTranscoder, RawTranscoder, Transcoder, TreeTranscoder,
};
use crate::{Error, Result};

/// Pagination window for commit history requests.
///
/// Values are formatted into `--skip`/`--max-count` by the handle itself;
/// no user-supplied text ever reaches an option position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    /// Number of commits to skip from the start of the range
    pub skip: Option<u32>,
    /// Maximum number of commits to return
    pub max_count: Option<u32>,
}

/// Handle to one repository under a collection root
#[derive(Debug, Clone)]
pub struct GitRepo {
    dir: PathBuf,
    id: String,
    git_binary: String,
}

impl GitRepo {
    /// Bind an identifier to its repository directory.
    ///
    /// Sanitizes the identifier and verifies the directory contains git
    /// metadata; both checks happen before anything else can run.
    pub fn open(root: impl AsRef<Path>, id: &str) -> Result<Self> {
        let sanitized = sanitize_repository_id(id).ok_or_else(|| Error::InvalidIdentifier {
            id: id.to_string(),
        })?;
        let dir = root.as_ref().join(&sanitized);
        if !dir.join(GIT_DATA_DIR).is_dir() {
            return Err(Error::RepositoryNotFound { id: sanitized });
        }
        Ok(Self {
            dir,
            id: sanitized,
            git_binary: "git".to_string(),
        })
    }

    /// Set a custom name or path for the git executable
    pub fn with_git_binary(mut self, binary: impl Into<String>) -> Self {
        self.git_binary = binary.into();
        self
    }

    /// The sanitized identifier this handle was built from
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The repository directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stream commit history starting at `revision` as a JSON array.
    pub async fn commits(
        &self,
        revision: &str,
        page: Page,
        sink: &mut impl ChunkSink,
    ) -> Result<()> {
        validate_revision(revision)?;
        let mut cmd = self
            .command()
            .args(["log", "--date=iso8601"])
            .arg(format!("--pretty=format:{}", log_format_template()));
        if let Some(skip) = page.skip {
            cmd = cmd.arg(format!("--skip={}", skip));
        }
        if let Some(max_count) = page.max_count {
            cmd = cmd.arg(format!("--max-count={}", max_count));
        }
        let cmd = cmd.arg(revision).arg("--");
        self.run(cmd, LogTranscoder::new(), LOG_RULES, sink).await
    }

    /// Stream the diff of one commit as `{"diff":"..."}`.
    ///
    /// Merge commits are diffed against every parent (`-m`).
    pub async fn commit_diff(&self, revision: &str, sink: &mut impl ChunkSink) -> Result<()> {
        validate_revision(revision)?;
        let cmd = self
            .command()
            .args(["show", "-m", "--format=", "--patch"])
            .arg(revision)
            .arg("--");
        self.run(cmd, DiffTranscoder::new(), DIFF_RULES, sink).await
    }

    /// Stream a directory listing at `revision` (default `HEAD`) as a JSON
    /// array, optionally recursing into subdirectories.
    pub async fn tree(
        &self,
        revision: Option<&str>,
        path: Option<&str>,
        recursive: bool,
        sink: &mut impl ChunkSink,
    ) -> Result<()> {
        let revision = revision.unwrap_or("HEAD");
        validate_revision(revision)?;
        let tree_ish = match path {
            Some(p) if !p.is_empty() => {
                validate_path(p)?;
                format!("{}:{}", revision, p)
            }
            _ => revision.to_string(),
        };
        let mut cmd = self.command().args(["ls-tree", "-l"]);
        if recursive {
            cmd = cmd.arg("-r");
        }
        let cmd = cmd.arg(tree_ish).arg("--");
        self.run(cmd, TreeTranscoder::new(), TREE_RULES, sink).await
    }

    /// Stream raw file content at `revision` without any transcoding.
    ///
    /// Binary-safe: bytes pass through verbatim. Content-type labeling is
    /// the caller's concern.
    pub async fn blob(&self, revision: &str, path: &str, sink: &mut impl ChunkSink) -> Result<()> {
        validate_revision(revision)?;
        if path.is_empty() {
            return Err(Error::InvalidArgument {
                reason: "empty path".to_string(),
            });
        }
        validate_path(path)?;
        let cmd = self
            .command()
            .arg("show")
            .arg(format!("{}:{}", revision, path))
            .arg("--");
        self.run(cmd, RawTranscoder, BLOB_RULES, sink).await
    }

    fn command(&self) -> GitCommand {
        GitCommand::new(&self.git_binary, &self.dir)
    }

    /// Drive one invocation through its transcoder: chunks go to the sink
    /// as they arrive, the closing sequence follows a clean exit, and a
    /// nonzero exit is classified from the last stderr chunk. Chunks sent
    /// before a late failure stay sent.
    async fn run(
        &self,
        cmd: GitCommand,
        mut transcoder: impl Transcoder,
        rules: &[Rule],
        sink: &mut impl ChunkSink,
    ) -> Result<()> {
        let mut buf = Vec::new();
        let outcome = cmd
            .stream(|chunk| {
                buf.clear();
                transcoder.push(chunk, &mut buf);
                if !buf.is_empty() {
                    sink.send(&buf);
                }
            })
            .await?;
        match outcome {
            RunOutcome::Exited { code: 0, .. } => {
                let mut closing = Vec::new();
                transcoder.finish(&mut closing);
                if !closing.is_empty() {
                    sink.send(&closing);
                }
                Ok(())
            }
            RunOutcome::Exited { code, stderr_tail } => Err(classify(rules, code, &stderr_tail)),
            RunOutcome::TimedOut => Err(Error::TimeoutExceeded),
        }
    }
}

/// Reject revision values git could read as an option flag or as
/// revision-range / revision-path syntax.
fn validate_revision(revision: &str) -> Result<()> {
    if revision.is_empty() {
        return Err(Error::InvalidArgument {
            reason: "empty revision".to_string(),
        });
    }
    if revision.starts_with('-') {
        return Err(Error::InvalidArgument {
            reason: format!("revision {:?} looks like an option flag", revision),
        });
    }
    if revision.contains("..") {
        return Err(Error::InvalidArgument {
            reason: "revision-range syntax is not accepted".to_string(),
        });
    }
    if revision.contains(':') {
        return Err(Error::InvalidArgument {
            reason: "revision must not contain ':'".to_string(),
        });
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<()> {
    if path.starts_with('-') {
        return Err(Error::InvalidArgument {
            reason: format!("path {:?} looks like an option flag", path),
        });
    }
    Ok(())
}
