//! Failure classification for nonzero git exits
//!
//! Maps the last captured stderr chunk of a failed invocation to a domain
//! error by literal prefix/suffix/substring matching against a fixed table
//! per operation family. A zero exit code is always success, regardless of
//! what git printed; an unmatched diagnostic becomes `Unexpected`.

use crate::Error;

/// Literal match against the captured diagnostic text
#[derive(Debug, Clone, Copy)]
pub(crate) enum Pattern {
    Prefix(&'static str),
    Suffix(&'static str),
    Contains(&'static str),
}

impl Pattern {
    fn matches(&self, text: &str) -> bool {
        match self {
            Pattern::Prefix(p) => text.starts_with(p),
            Pattern::Suffix(s) => text.ends_with(s),
            Pattern::Contains(c) => text.contains(c),
        }
    }
}

/// Domain meaning of a matched diagnostic
#[derive(Debug, Clone, Copy)]
pub(crate) enum Diag {
    RevisionNotFound,
    PathNotADirectory,
    FileNotFound,
    RepositoryAlreadyExists,
    InvalidRemoteUrl,
}

impl From<Diag> for Error {
    fn from(diag: Diag) -> Self {
        match diag {
            Diag::RevisionNotFound => Error::RevisionNotFound,
            Diag::PathNotADirectory => Error::PathNotADirectory,
            Diag::FileNotFound => Error::FileNotFound,
            Diag::RepositoryAlreadyExists => Error::RepositoryAlreadyExists,
            Diag::InvalidRemoteUrl => Error::InvalidRemoteUrl,
        }
    }
}

pub(crate) type Rule = (Pattern, Diag);

/// `git clone` diagnostics
pub(crate) const CLONE_RULES: &[Rule] = &[
    (
        Pattern::Suffix("already exists and is not an empty directory.\n"),
        Diag::RepositoryAlreadyExists,
    ),
    (
        Pattern::Contains("already exists and is not an empty directory"),
        Diag::RepositoryAlreadyExists,
    ),
    (Pattern::Prefix("fatal: unable to access "), Diag::InvalidRemoteUrl),
    (Pattern::Prefix("fatal: repository "), Diag::InvalidRemoteUrl),
    (Pattern::Contains("Could not resolve host"), Diag::InvalidRemoteUrl),
];

/// `git log` diagnostics
pub(crate) const LOG_RULES: &[Rule] = &[
    (Pattern::Prefix("fatal: bad revision"), Diag::RevisionNotFound),
    (Pattern::Prefix("fatal: ambiguous argument"), Diag::RevisionNotFound),
    (Pattern::Prefix("fatal: unknown revision"), Diag::RevisionNotFound),
    (
        Pattern::Contains("does not have any commits yet"),
        Diag::RevisionNotFound,
    ),
];

/// `git ls-tree` diagnostics
pub(crate) const TREE_RULES: &[Rule] = &[
    (Pattern::Contains("not a tree object"), Diag::PathNotADirectory),
    (
        Pattern::Prefix("fatal: Not a valid object name"),
        Diag::RevisionNotFound,
    ),
    (
        Pattern::Prefix("fatal: not a valid object name"),
        Diag::RevisionNotFound,
    ),
    (Pattern::Prefix("fatal: ambiguous argument"), Diag::RevisionNotFound),
];

/// `git show <rev>` (diff) diagnostics
pub(crate) const DIFF_RULES: &[Rule] = &[
    (Pattern::Prefix("fatal: bad object"), Diag::RevisionNotFound),
    (Pattern::Prefix("fatal: bad revision"), Diag::RevisionNotFound),
    (Pattern::Prefix("fatal: ambiguous argument"), Diag::RevisionNotFound),
];

/// `git show <rev>:<path>` (blob) diagnostics
pub(crate) const BLOB_RULES: &[Rule] = &[
    (
        Pattern::Prefix("fatal: invalid object name"),
        Diag::RevisionNotFound,
    ),
    (Pattern::Contains("does not exist in"), Diag::FileNotFound),
    (Pattern::Contains("exists on disk, but not in"), Diag::FileNotFound),
    (Pattern::Prefix("fatal: ambiguous argument"), Diag::RevisionNotFound),
];

/// Select the domain error for a nonzero exit
pub(crate) fn classify(rules: &[Rule], status: i32, stderr_tail: &str) -> Error {
    for (pattern, diag) in rules {
        if pattern.matches(stderr_tail) {
            return (*diag).into();
        }
    }
    Error::Unexpected {
        status,
        stderr: stderr_tail.trim_end().to_string(),
    }
}
