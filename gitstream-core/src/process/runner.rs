//! Subprocess execution for git invocations
//!
//! Spawns git with stdin closed and stdout/stderr captured as async byte
//! streams, delivers stdout chunks to a caller closure in OS-delivery order,
//! and enforces an optional wall-clock deadline that tears the child down.
//! The lifecycle is an explicit state machine: Starting → Streaming →
//! Draining → Done/Failed, with TimedOut reachable from any running state.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::{Error, Result};

/// Lifecycle state of one subprocess invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Spawn requested, no I/O yet
    Starting,
    /// Stdout/stderr open, chunks flowing
    Streaming,
    /// Output streams reached EOF, waiting for exit
    Draining,
    /// Exited with code zero
    Done,
    /// Exited with a nonzero code
    Failed,
    /// Deadline fired before exit; child was killed
    TimedOut,
}

/// Terminal outcome of an invocation that got as far as spawning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The process exited on its own
    Exited {
        /// Exit code (-1 when terminated by a signal)
        code: i32,
        /// Most recently received stderr chunk, lossily decoded. Only the
        /// last chunk is kept; git's fatal diagnostics are a single short
        /// line, so this is sufficient for classification.
        stderr_tail: String,
    },
    /// The deadline fired first; streams were destroyed and the process
    /// killed, and no further chunks were delivered
    TimedOut,
}

/// One git subprocess invocation: command name, ordered argument vector,
/// working directory and an optional wall-clock timeout.
///
/// Stdin is always closed; stdout and stderr are always captured. Callers
/// are responsible for validating any user-controlled argument values before
/// they are added here.
#[derive(Debug, Clone)]
pub struct GitCommand {
    binary: String,
    args: Vec<OsString>,
    cwd: PathBuf,
    timeout: Option<Duration>,
}

impl GitCommand {
    /// Create an invocation rooted at `cwd`
    pub fn new(binary: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            timeout: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a wall-clock deadline for the whole invocation
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The working directory of this invocation
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Run the subprocess, delivering each stdout chunk to `on_stdout` as
    /// the OS produces it. Chunk sizes and boundaries are whatever the pipe
    /// delivers; they carry no record alignment.
    ///
    /// On timeout the child and both streams are dropped (the child is
    /// killed on drop) and `RunOutcome::TimedOut` is returned; `on_stdout`
    /// is never called again after that point.
    pub async fn stream(mut self, mut on_stdout: impl FnMut(&[u8])) -> Result<RunOutcome> {
        let timeout = self.timeout.take();
        let binary = self.binary.clone();
        let fut = self.stream_inner(&mut on_stdout);
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        binary = %binary,
                        timeout_ms = limit.as_millis() as u64,
                        state = ?RunState::TimedOut,
                        "deadline fired, killing subprocess"
                    );
                    Ok(RunOutcome::TimedOut)
                }
            },
            None => fut.await,
        }
    }

    async fn stream_inner(self, on_stdout: &mut impl FnMut(&[u8])) -> Result<RunOutcome> {
        let mut state = RunState::Starting;
        tracing::debug!(?state, binary = %self.binary, args = ?self.args, cwd = %self.cwd.display(), "spawning");

        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Unexpected {
                status: -1,
                stderr: format!("failed to spawn {}: {}", self.binary, e),
            })?;

        let mut stdout = child.stdout.take().ok_or_else(|| Error::Unexpected {
            status: -1,
            stderr: "child stdout was not captured".to_string(),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| Error::Unexpected {
            status: -1,
            stderr: "child stderr was not captured".to_string(),
        })?;

        state = RunState::Streaming;
        tracing::trace!(?state);

        let mut stderr_tail: Vec<u8> = Vec::new();
        let mut out_buf = [0u8; 8192];
        let mut err_buf = [0u8; 8192];
        let mut stdout_open = true;
        let mut stderr_open = true;

        while stdout_open || stderr_open {
            tokio::select! {
                read = stdout.read(&mut out_buf), if stdout_open => {
                    let n = read?;
                    if n == 0 {
                        stdout_open = false;
                        if !stderr_open {
                            state = RunState::Draining;
                            tracing::trace!(?state);
                        }
                    } else {
                        on_stdout(&out_buf[..n]);
                    }
                }
                read = stderr.read(&mut err_buf), if stderr_open => {
                    let n = read?;
                    if n == 0 {
                        stderr_open = false;
                        if !stdout_open {
                            state = RunState::Draining;
                            tracing::trace!(?state);
                        }
                    } else {
                        // single-shot capture: only the last chunk is kept
                        stderr_tail.clear();
                        stderr_tail.extend_from_slice(&err_buf[..n]);
                    }
                }
            }
        }

        let status = child.wait().await?;
        let code = status.code().unwrap_or(-1);
        state = if code == 0 {
            RunState::Done
        } else {
            RunState::Failed
        };
        tracing::debug!(?state, code, "subprocess exited");

        Ok(RunOutcome::Exited {
            code,
            stderr_tail: String::from_utf8_lossy(&stderr_tail).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> GitCommand {
        GitCommand::new("sh", std::env::temp_dir()).args(["-c", script])
    }

    #[tokio::test]
    async fn test_stdout_chunks_arrive_in_order() {
        let mut collected = Vec::new();
        let outcome = sh("printf one; printf two")
            .stream(|chunk| collected.extend_from_slice(chunk))
            .await
            .unwrap();
        assert_eq!(collected, b"onetwo");
        assert_eq!(
            outcome,
            RunOutcome::Exited {
                code: 0,
                stderr_tail: String::new()
            }
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_keeps_stderr_tail() {
        let outcome = sh("echo oops >&2; exit 3").stream(|_| {}).await.unwrap();
        match outcome {
            RunOutcome::Exited { code, stderr_tail } => {
                assert_eq!(code, 3);
                assert_eq!(stderr_tail, "oops\n");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_exit_with_stderr_noise_is_success() {
        let outcome = sh("echo warning >&2; exit 0").stream(|_| {}).await.unwrap();
        match outcome {
            RunOutcome::Exited { code, .. } => assert_eq!(code, 0),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_and_stops_chunks() {
        let mut chunks = 0usize;
        let outcome = sh("printf start; sleep 5; printf late")
            .with_timeout(Duration::from_millis(100))
            .stream(|_| chunks += 1)
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::TimedOut);
        assert!(chunks <= 1, "no chunks may arrive after the timeout");
    }

    #[tokio::test]
    async fn test_fast_process_beats_timeout() {
        let outcome = sh("printf ok")
            .with_timeout(Duration::from_secs(30))
            .stream(|_| {})
            .await
            .unwrap();
        match outcome {
            RunOutcome::Exited { code, .. } => assert_eq!(code, 0),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_unexpected_error() {
        let err = GitCommand::new("definitely-not-a-real-binary-xyz", std::env::temp_dir())
            .stream(|_| {})
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UNEXPECTED_ERROR");
    }

    #[tokio::test]
    async fn test_large_output_streams_through() {
        let mut total = 0usize;
        sh("head -c 200000 /dev/zero")
            .stream(|chunk| total += chunk.len())
            .await
            .unwrap();
        assert_eq!(total, 200_000);
    }
}
