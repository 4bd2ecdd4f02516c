//! Git repository operations.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::NaiveDateTime;

/// Author date format handed to git; no zone, so git reads it as local time.
const AUTHOR_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who wrote a commit, and when.
#[derive(Debug, Clone)]
pub struct Author<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub date: NaiveDateTime,
}

/// A git repository handle that provides common operations.
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Find the git repository root starting from the given directory.
    pub fn discover(start: &Path) -> Result<Self, Error> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(start)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Exec(format!("git rev-parse: {e}")))?;

        if !output.status.success() {
            return Err(Error::NotARepo(start.display().to_string()));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    /// Get the repository root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stage one path.
    pub fn add(&self, path: &str) -> Result<(), Error> {
        self.run(&["add", "--", path], &[])
    }

    /// Remove a path from the index and the work tree; absent paths are ignored.
    pub fn rm(&self, path: &str) -> Result<(), Error> {
        self.run(&["rm", "-r", "-q", "--ignore-unmatch", "--", path], &[])
    }

    /// Check whether the index differs from HEAD.
    pub fn has_staged_changes(&self) -> Result<bool, Error> {
        let status = self
            .command(&["diff", "--cached", "--quiet"], &[])
            .status()
            .map_err(|e| Error::Exec(format!("git diff: {e}")))?;

        match status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(Error::Failed("git diff --cached --quiet".to_string())),
        }
    }

    /// Commit the index as `author`, returning the short hash.
    pub fn commit_as(&self, message: &str, author: &Author<'_>) -> Result<String, Error> {
        let date = author.date.format(AUTHOR_DATE_FORMAT).to_string();
        self.run(
            &["commit", "-q", "-m", message],
            &[
                ("GIT_AUTHOR_NAME", author.name),
                ("GIT_AUTHOR_EMAIL", author.email),
                ("GIT_AUTHOR_DATE", date.as_str()),
            ],
        )?;
        self.head_short()
    }

    /// Get the short hash of HEAD.
    pub fn head_short(&self) -> Result<String, Error> {
        let hash = self.run_output(&["rev-parse", "HEAD"])?;
        let hash = hash.trim();
        Ok(hash[..8.min(hash.len())].to_string())
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn command(&self, args: &[&str], envs: &[(&str, &str)]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .envs(envs.iter().copied())
            .current_dir(&self.root)
            .stdin(Stdio::null());
        cmd
    }

    /// Run a git command that produces no output we care about.
    fn run(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<(), Error> {
        let status = self
            .command(args, envs)
            .status()
            .map_err(|e| Error::Exec(format!("git {}: {e}", args.first().unwrap_or(&""))))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Failed(format!("git {}", args.join(" "))))
        }
    }

    /// Run a git command and capture its stdout.
    fn run_output(&self, args: &[&str]) -> Result<String, Error> {
        let output = self
            .command(args, &[])
            .output()
            .map_err(|e| Error::Exec(format!("git {}: {e}", args.first().unwrap_or(&""))))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(Error::Failed(format!("git {}", args.join(" "))))
        }
    }
}

/// Errors from git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to execute: {0}")]
    Exec(String),

    #[error("not a git repository (searched from '{0}')")]
    NotARepo(String),

    #[error("{0}")]
    Failed(String),
}
