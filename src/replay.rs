//! Replaying grouped changes as git commits.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::changeset::ChangeSet;
use crate::error::{Error, Result};
use crate::git::{Author, Git};
use crate::model::Change;

/// Message used for check-ins that carried no comment.
pub const EMPTY_COMMENT_MESSAGE: &str = "(none)";

/// What a replay did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Short hashes of the commits created, oldest first
    pub commits: Vec<String>,

    /// Changesets that left the index unchanged
    pub skipped: usize,
}

/// Apply every changeset to the work tree of `git` and commit it.
///
/// Stops at the first failure; commits made so far stay in place.
pub fn replay(git: &Git, changesets: &[ChangeSet<Change>]) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (idx, cs) in changesets.iter().enumerate() {
        for change in cs.checkins() {
            apply(git, change)?;
        }

        if !git.has_staged_changes()? {
            debug!(changeset = idx + 1, "nothing staged, skipping");
            summary.skipped += 1;
            continue;
        }

        let message = commit_message(cs.comment());
        let author = Author {
            name: cs.user(),
            email: "",
            date: cs.date(),
        };
        let hash = git.commit_as(message, &author)?;
        info!(
            changeset = idx + 1,
            total = changesets.len(),
            %hash,
            user = cs.user(),
            "committed"
        );
        summary.commits.push(hash);
    }

    Ok(summary)
}

fn apply(git: &Git, change: &Change) -> Result<()> {
    let path = change.relative_path();
    match change.content_version() {
        Some(content) => {
            copy_content(Path::new(&content.full_path), &git.root().join(path))?;
            git.add(path)?;
        }
        None => {
            if !git.root().join(path).exists() {
                warn!(path, "deleting a path that is not in the work tree");
            }
            git.rm(path)?;
        }
    }
    debug!(kind = ?change.kind(), path, "applied");
    Ok(())
}

fn copy_content(from: &Path, to: &Path) -> Result<()> {
    let io_err = |source| Error::Io {
        path: from.display().to_string(),
        source,
    };
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::copy(from, to).map_err(io_err)?;
    Ok(())
}

/// Commit message for a changeset comment.
pub fn commit_message(comment: &str) -> &str {
    if comment.trim().is_empty() {
        EMPTY_COMMENT_MESSAGE
    } else {
        comment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_comments_get_placeholder() {
        assert_eq!(commit_message(""), "(none)");
        assert_eq!(commit_message("  \n"), "(none)");
        assert_eq!(commit_message("fix\n\ndetails"), "fix\n\ndetails");
    }

    #[test]
    fn copies_into_new_directories() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("source.c");
        std::fs::write(&from, "int x;\n").unwrap();
        let to = dir.path().join("repo/src/deep/x.c");

        copy_content(&from, &to).unwrap();
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "int x;\n");
    }

    #[test]
    fn missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_content(&dir.path().join("absent"), &dir.path().join("x")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
