//! Core records: element versions and the changes derived from them.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Separator between an element path and its version selector.
pub const VERSION_SELECTOR: &str = "@@";

/// Whether a versioned element is a plain file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    File,
    Directory,
}

impl ElementKind {
    /// Argument for `cleartool find -type`.
    pub fn find_type(self) -> &'static str {
        match self {
            ElementKind::File => "f",
            ElementKind::Directory => "d",
        }
    }
}

/// One immutable revision of a versioned element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    /// When the revision was checked in (tool-local wall-clock time)
    pub date: NaiveDateTime,

    /// Author of the check-in
    pub user: String,

    /// Identifier shared by every revision of the same element
    pub element_id: String,

    /// Fully qualified versioned path, including the version selector
    pub full_path: String,

    /// Path relative to the reconstruction root, selector stripped
    pub relative_path: String,

    /// Check-in message; may span several lines or be empty
    pub comment: String,

    /// File or directory, as reported by the query that produced this record
    pub kind: ElementKind,
}

impl Version {
    pub fn is_directory(&self) -> bool {
        self.kind == ElementKind::Directory
    }
}

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Modify,
    Delete,
}

impl ChangeKind {
    /// Single-letter tag used in reports.
    pub fn letter(self) -> char {
        match self {
            ChangeKind::Add => 'A',
            ChangeKind::Modify => 'M',
            ChangeKind::Delete => 'D',
        }
    }
}

/// A resolved add, modify or delete of one relative path.
///
/// Constructed only through [`Change::add`], [`Change::modify`] and
/// [`Change::delete`], so a delete never carries content and an add or
/// modify always does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    kind: ChangeKind,
    relative_path: String,
    causing_version: Version,
    content_version: Option<Version>,
}

impl Change {
    /// `path` appeared inside the directory revision `causing`; `content`
    /// is the version to materialize there.
    pub fn add(path: String, causing: Version, content: Version) -> Self {
        Self {
            kind: ChangeKind::Add,
            relative_path: path,
            causing_version: causing,
            content_version: Some(content),
        }
    }

    /// A file's own new revision, which is also its content.
    pub fn modify(version: Version) -> Self {
        Self {
            kind: ChangeKind::Modify,
            relative_path: version.relative_path.clone(),
            content_version: Some(version.clone()),
            causing_version: version,
        }
    }

    /// `path` disappeared from the directory revision `causing`.
    pub fn delete(path: String, causing: Version) -> Self {
        Self {
            kind: ChangeKind::Delete,
            relative_path: path,
            causing_version: causing,
            content_version: None,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn causing_version(&self) -> &Version {
        &self.causing_version
    }

    pub fn content_version(&self) -> Option<&Version> {
        self.content_version.as_ref()
    }
}

/// Anything that can be grouped into a changeset.
pub trait Checkin {
    fn date(&self) -> NaiveDateTime;
    fn user(&self) -> &str;
    fn comment(&self) -> &str;
}

impl Checkin for Version {
    fn date(&self) -> NaiveDateTime {
        self.date
    }

    fn user(&self) -> &str {
        &self.user
    }

    fn comment(&self) -> &str {
        &self.comment
    }
}

impl Checkin for Change {
    fn date(&self) -> NaiveDateTime {
        self.causing_version.date
    }

    fn user(&self) -> &str {
        &self.causing_version.user
    }

    fn comment(&self) -> &str {
        &self.causing_version.comment
    }
}

/// Strip the version selector from a versioned path.
pub fn strip_selector(full_path: &str) -> &str {
    match full_path.find(VERSION_SELECTOR) {
        Some(idx) => &full_path[..idx],
        None => full_path,
    }
}

/// Path of `full_path` relative to `root`, or `None` if it lies outside.
///
/// The root itself maps to the empty string.
pub fn relative_to(root: &str, full_path: &str) -> Option<String> {
    let path = strip_selector(full_path);
    let root = root.trim_end_matches('/');
    let rest = path.strip_prefix(root)?;
    if rest.is_empty() {
        return Some(String::new());
    }
    rest.strip_prefix('/').map(str::to_string)
}

/// Join a directory's relative path and an entry name.
pub fn join_relative(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
