//! Error types for GitStream operations

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for GitStream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Closed error taxonomy for GitStream operations.
///
/// Every failure is classified at the point of detection and surfaced
/// immediately; nothing is retried. Chunks already emitted before a late
/// failure are not retracted, so a terminal error means "any emitted prefix
/// is incomplete".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The configured repository root directory does not exist
    #[error("repository root not found: {path}")]
    RootNotFound {
        /// The root that was configured
        path: PathBuf,
    },

    /// No git repository with the given identifier under the root
    #[error("repository not found: {id}")]
    RepositoryNotFound {
        /// The identifier that was requested
        id: String,
    },

    /// Identifier failed sanitization (empty or path-traversal attempt)
    #[error("invalid repository identifier: {id:?}")]
    InvalidIdentifier {
        /// The raw identifier as supplied
        id: String,
    },

    /// Operation parameter could be interpreted as an option flag or
    /// revision-range syntax by git
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was rejected and why
        reason: String,
    },

    /// Git reported that the requested revision does not exist
    #[error("revision not found")]
    RevisionNotFound,

    /// The requested path does not name a tree (directory) object
    #[error("path is not a directory")]
    PathNotADirectory,

    /// The requested file does not exist at the given revision
    #[error("file not found")]
    FileNotFound,

    /// Clone destination already exists and is not empty
    #[error("repository already exists")]
    RepositoryAlreadyExists,

    /// Git could not use the supplied remote URL
    #[error("invalid remote repository URL")]
    InvalidRemoteUrl,

    /// The subprocess did not finish within the configured timeout
    #[error("timeout exceeded")]
    TimeoutExceeded,

    /// Catch-all for unclassified failures
    #[error("unexpected error (exit code {status}): {stderr}")]
    Unexpected {
        /// Exit code of the subprocess, or -1 when it never ran
        status: i32,
        /// Last captured stderr chunk, or a local failure description
        stderr: String,
    },
}

impl Error {
    /// Stable machine-readable error code for the embedding response layer
    pub fn code(&self) -> &'static str {
        match self {
            Error::RootNotFound { .. } => "ROOT_NOT_FOUND",
            Error::RepositoryNotFound { .. } => "REPOSITORY_NOT_FOUND",
            Error::InvalidIdentifier { .. } => "INVALID_IDENTIFIER",
            Error::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Error::RevisionNotFound => "REVISION_NOT_FOUND",
            Error::PathNotADirectory => "PATH_NOT_A_DIRECTORY",
            Error::FileNotFound => "FILE_NOT_FOUND",
            Error::RepositoryAlreadyExists => "REPOSITORY_ALREADY_EXISTS",
            Error::InvalidRemoteUrl => "INVALID_REMOTE_URL",
            Error::TimeoutExceeded => "TIMEOUT_EXCEEDED",
            Error::Unexpected { .. } => "UNEXPECTED_ERROR",
        }
    }

    /// Wrap a local I/O failure as an unclassified error
    pub(crate) fn unexpected_io(err: std::io::Error) -> Self {
        Error::Unexpected {
            status: -1,
            stderr: err.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::unexpected_io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            Error::InvalidIdentifier { id: "../x".into() }.code(),
            "INVALID_IDENTIFIER"
        );
        assert_eq!(Error::TimeoutExceeded.code(), "TIMEOUT_EXCEEDED");
        assert_eq!(
            Error::Unexpected {
                status: 128,
                stderr: "fatal: boom".into()
            }
            .code(),
            "UNEXPECTED_ERROR"
        );
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::RepositoryNotFound { id: "demo".into() };
        assert_eq!(err.to_string(), "repository not found: demo");
    }
}
