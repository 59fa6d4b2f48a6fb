//! Repository collection rooted at a single directory
//!
//! Enumerates git repositories under a root and performs whole-repository
//! lifecycle operations: create via remote clone, destroy via recursive
//! delete. Mutating operations run fully in parallel when invoked
//! concurrently; git's own locking is the only mutual exclusion.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::DEFAULT_CLONE_TIMEOUT_SECS;
use crate::process::classify::{classify, CLONE_RULES};
use crate::process::runner::{GitCommand, RunOutcome};
use crate::repo::sanitize::sanitize_repository_id;
use crate::{Error, Result};

/// Marker directory that identifies a git repository
pub(crate) const GIT_DATA_DIR: &str = ".git";

/// Collection of git repositories under one root directory
#[derive(Debug, Clone)]
pub struct ReposDir {
    root: PathBuf,
    git_binary: String,
    clone_timeout: Duration,
}

impl ReposDir {
    /// Open the collection rooted at `root`.
    ///
    /// Fails with `RootNotFound` if the root directory does not exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::RootNotFound { path: root });
        }
        Ok(Self {
            root,
            git_binary: "git".to_string(),
            clone_timeout: Duration::from_secs(DEFAULT_CLONE_TIMEOUT_SECS),
        })
    }

    /// Set a custom name or path for the git executable
    pub fn with_git_binary(mut self, binary: impl Into<String>) -> Self {
        self.git_binary = binary.into();
        self
    }

    /// Set the wall-clock timeout for clone operations
    pub fn with_clone_timeout(mut self, timeout: Duration) -> Self {
        self.clone_timeout = timeout;
        self
    }

    /// The collection root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of immediate subdirectories that are git repositories, sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if !file_type.is_dir() {
                continue;
            }
            if !is_git_repo(&entry.path()).await {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete a repository and everything under it.
    ///
    /// The identifier is sanitized first; a directory that is not a git
    /// repository is refused rather than deleted.
    pub async fn remove_repo(&self, id: &str) -> Result<()> {
        let sanitized = sanitize_repository_id(id).ok_or_else(|| Error::InvalidIdentifier {
            id: id.to_string(),
        })?;
        let dir = self.root.join(&sanitized);
        if !is_git_repo(&dir).await {
            return Err(Error::RepositoryNotFound { id: sanitized });
        }
        tracing::debug!(repo = %sanitized, "removing repository");
        remove_tree(&dir).await
    }

    /// Clone a remote repository into the collection.
    ///
    /// The optional destination identifier is sanitized before any
    /// subprocess is launched; the remote URL is passed to git unvalidated,
    /// after an explicit end-of-options marker, and rejected by the tool
    /// itself when unusable. Bounded by the clone timeout.
    pub async fn clone_repo(&self, url: &str, id: Option<&str>) -> Result<()> {
        let dest = match id {
            Some(raw) => Some(sanitize_repository_id(raw).ok_or_else(|| {
                Error::InvalidIdentifier {
                    id: raw.to_string(),
                }
            })?),
            None => None,
        };

        let mut cmd = GitCommand::new(&self.git_binary, &self.root)
            .args(["clone", "--"])
            .arg(url)
            .with_timeout(self.clone_timeout);
        if let Some(dest) = &dest {
            cmd = cmd.arg(self.root.join(dest));
        }

        tracing::debug!(url, dest = ?dest, "cloning repository");
        match cmd.stream(|_| {}).await? {
            RunOutcome::Exited { code: 0, .. } => Ok(()),
            RunOutcome::Exited { code, stderr_tail } => {
                Err(classify(CLONE_RULES, code, &stderr_tail))
            }
            RunOutcome::TimedOut => Err(Error::TimeoutExceeded),
        }
    }
}

/// Whether `dir` contains git metadata
async fn is_git_repo(dir: &Path) -> bool {
    matches!(
        tokio::fs::metadata(dir.join(GIT_DATA_DIR)).await,
        Ok(meta) if meta.is_dir()
    )
}

/// Depth-first recursive delete that treats every entry type explicitly.
///
/// Files and symlinks are unlinked as entries (symlinks are never
/// followed, so nothing outside the tree can be reached); directories are
/// removed after their contents, deepest first.
async fn remove_tree(root: &Path) -> Result<()> {
    let mut dirs = vec![root.to_path_buf()];
    let mut i = 0;
    while i < dirs.len() {
        let dir = dirs[i].clone();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            // DirEntry::file_type does not traverse symlinks
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                dirs.push(entry.path());
            } else {
                tokio::fs::remove_file(entry.path()).await?;
            }
        }
        i += 1;
    }
    for dir in dirs.iter().rev() {
        tokio::fs::remove_dir(dir).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Create a directory that merely looks like a git repository; no git
    /// binary is needed for that.
    fn fake_repo(root: &Path, name: &str) {
        std::fs::create_dir_all(root.join(name).join(GIT_DATA_DIR)).unwrap();
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Initialize a real repository with one commit
    fn init_real_repo(dir: &Path) {
        let run = |args: &[&str]| {
            let status = std::process::Command::new("git")
                .args(args)
                .current_dir(dir)
                .env("GIT_AUTHOR_NAME", "Test")
                .env("GIT_AUTHOR_EMAIL", "test@example.com")
                .env("GIT_COMMITTER_NAME", "Test")
                .env("GIT_COMMITTER_EMAIL", "test@example.com")
                .status()
                .unwrap();
            assert!(status.success(), "git {:?} failed", args);
        };
        run(&["init", "-q"]);
        std::fs::write(dir.join("file.txt"), "content\n").unwrap();
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "initial"]);
    }

    #[test]
    fn test_new_missing_root_fails() {
        let err = ReposDir::new("/definitely/not/a/real/root/xyz").unwrap_err();
        assert_eq!(err.code(), "ROOT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_filters_non_repositories() {
        let temp = TempDir::new().unwrap();
        fake_repo(temp.path(), "valid");
        std::fs::create_dir(temp.path().join("plain")).unwrap();
        std::fs::write(temp.path().join("stray.txt"), "x").unwrap();

        let repos = ReposDir::new(temp.path()).unwrap();
        assert_eq!(repos.list().await.unwrap(), vec!["valid".to_string()]);
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let temp = TempDir::new().unwrap();
        fake_repo(temp.path(), "zulu");
        fake_repo(temp.path(), "alpha");

        let repos = ReposDir::new(temp.path()).unwrap();
        assert_eq!(
            repos.list().await.unwrap(),
            vec!["alpha".to_string(), "zulu".to_string()]
        );
    }

    #[tokio::test]
    async fn test_remove_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let repos = ReposDir::new(temp.path()).unwrap();
        let err = repos.remove_repo("../../etc").await.unwrap_err();
        assert_eq!(err.code(), "INVALID_IDENTIFIER");
    }

    #[tokio::test]
    async fn test_remove_refuses_non_repository() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("plain")).unwrap();
        let repos = ReposDir::new(temp.path()).unwrap();
        let err = repos.remove_repo("plain").await.unwrap_err();
        assert_eq!(err.code(), "REPOSITORY_NOT_FOUND");
        assert!(temp.path().join("plain").exists());
    }

    #[tokio::test]
    async fn test_remove_deletes_nested_tree() {
        let temp = TempDir::new().unwrap();
        fake_repo(temp.path(), "demo");
        let deep = temp.path().join("demo/sub/deeper");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(deep.join("f.txt"), "x").unwrap();
        std::fs::write(temp.path().join("demo/top.txt"), "y").unwrap();

        let repos = ReposDir::new(temp.path()).unwrap();
        repos.remove_repo("demo").await.unwrap();
        assert!(!temp.path().join("demo").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_remove_does_not_follow_symlinks() {
        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("outside");
        std::fs::create_dir(&outside).unwrap();
        std::fs::write(outside.join("keep.txt"), "precious").unwrap();

        let root = temp.path().join("root");
        std::fs::create_dir(&root).unwrap();
        fake_repo(&root, "demo");
        std::os::unix::fs::symlink(&outside, root.join("demo/link")).unwrap();

        let repos = ReposDir::new(&root).unwrap();
        repos.remove_repo("demo").await.unwrap();
        assert!(!root.join("demo").exists());
        assert!(outside.join("keep.txt").exists());
    }

    #[tokio::test]
    async fn test_clone_rejects_traversal_destination() {
        let temp = TempDir::new().unwrap();
        let repos = ReposDir::new(temp.path()).unwrap();
        // rejected before any subprocess is launched, so a bogus binary
        // never gets the chance to fail differently
        let repos = repos.with_git_binary("definitely-not-a-real-binary-xyz");
        let err = repos
            .clone_repo("https://example.com/x.git", Some("../../etc"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_IDENTIFIER");
    }

    #[tokio::test]
    async fn test_clone_from_local_path() {
        if !git_available() {
            eprintln!("skipping: git not available");
            return;
        }
        let source = TempDir::new().unwrap();
        init_real_repo(source.path());

        let temp = TempDir::new().unwrap();
        let repos = ReposDir::new(temp.path()).unwrap();
        repos
            .clone_repo(source.path().to_str().unwrap(), Some("cloned"))
            .await
            .unwrap();
        assert_eq!(repos.list().await.unwrap(), vec!["cloned".to_string()]);
    }

    #[tokio::test]
    async fn test_clone_into_existing_destination() {
        if !git_available() {
            eprintln!("skipping: git not available");
            return;
        }
        let source = TempDir::new().unwrap();
        init_real_repo(source.path());

        let temp = TempDir::new().unwrap();
        fake_repo(temp.path(), "taken");
        std::fs::write(temp.path().join("taken/occupied.txt"), "x").unwrap();

        let repos = ReposDir::new(temp.path()).unwrap();
        let err = repos
            .clone_repo(source.path().to_str().unwrap(), Some("taken"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "REPOSITORY_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_clone_invalid_local_remote() {
        if !git_available() {
            eprintln!("skipping: git not available");
            return;
        }
        let temp = TempDir::new().unwrap();
        let repos = ReposDir::new(temp.path()).unwrap();
        let err = repos
            .clone_repo("/definitely/not/a/repo/xyz", Some("dest"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_REMOTE_URL");
    }
}
