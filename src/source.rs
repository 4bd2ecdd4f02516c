//! The external history tool, seen as a capability.

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::model::ElementKind;

/// A recursive history query over one kind of element below a root.
#[derive(Debug, Clone, Copy)]
pub struct HistoryQuery<'a> {
    pub root: &'a str,
    pub kind: ElementKind,
    pub branch: Option<&'a str>,
    pub since: Option<NaiveDateTime>,
    pub format: &'a str,
}

/// Something that can answer history and directory-diff queries.
///
/// Each call blocks until the underlying tool finishes and returns its
/// standard output. A failing tool is an error; callers never retry.
pub trait HistorySource {
    /// History records of every element of `query.kind` below `query.root`.
    fn history(&self, query: &HistoryQuery<'_>) -> Result<String>;

    /// History records of the single element named by `path`.
    fn element_history(&self, path: &str, format: &str) -> Result<String>;

    /// Diff of the directory version `directory` against its predecessor.
    fn diff_predecessor(&self, directory: &str) -> Result<String>;
}
