//! Structural changes of a directory version.
//!
//! `cleartool diff -diff_format -pred` on a directory prints one line per
//! entry that differs from the predecessor:
//!
//! ```text
//! < removed.c  1024  15-Mar-05.14:30:00
//! > added.c    2048  16-Mar-05.09:00:00
//! ```
//!
//! Sub-directory entries end in `/` and are left to their own history.
//! Symbolic links (`name --> target`) are not modelled and only logged.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{ChangeKind, Version};
use crate::source::HistorySource;

// A marker is followed by a space; `<<<`/`>>>` header lines are not entries.
const REMOVED: &str = "< ";
const ADDED: &str = "> ";
const LINK_ARROW: &str = "->";

/// A name that appeared in or disappeared from a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralChange {
    /// `Add` or `Delete`, never `Modify`
    pub kind: ChangeKind,
    pub name: String,
}

/// Asks the history tool what a directory version added and removed.
pub struct DirectoryDiffResolver<'a> {
    source: &'a dyn HistorySource,
}

impl<'a> DirectoryDiffResolver<'a> {
    pub fn new(source: &'a dyn HistorySource) -> Self {
        Self { source }
    }

    /// Names added to or removed from `version` relative to its predecessor.
    pub fn structural_changes(&self, version: &Version) -> Result<Vec<StructuralChange>> {
        let output = self.source.diff_predecessor(&version.full_path)?;
        parse_directory_diff(&output)
    }
}

/// Classify the lines of a directory diff.
pub fn parse_directory_diff(output: &str) -> Result<Vec<StructuralChange>> {
    let mut changes = Vec::new();

    for line in output.lines() {
        let line = line.trim_end();
        let (kind, rest) = if let Some(rest) = line.strip_prefix(REMOVED) {
            (ChangeKind::Delete, rest)
        } else if let Some(rest) = line.strip_prefix(ADDED) {
            (ChangeKind::Add, rest)
        } else {
            continue;
        };

        if line.contains(LINK_ARROW) {
            warn!(entry = %rest.trim(), "skipping symbolic link");
            continue;
        }

        let name = entry_name(rest).ok_or_else(|| Error::MalformedDiffLine {
            line: line.to_string(),
        })?;

        if name.ends_with('/') {
            debug!(name, "ignoring sub-directory entry");
            continue;
        }

        changes.push(StructuralChange {
            kind,
            name: name.to_string(),
        });
    }

    Ok(changes)
}

/// The entry name, with the trailing size and timestamp fields removed.
fn entry_name(rest: &str) -> Option<&str> {
    let (rest, _date) = rest.trim().rsplit_once(char::is_whitespace)?;
    let (name, _size) = rest.trim_end().rsplit_once(char::is_whitespace)?;
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}
