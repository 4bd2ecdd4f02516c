//! Fetching and parsing per-element history records.
//!
//! Each record is one line of five tab-separated fields
//! (`date`, `action`, `user`, `element id`, `path`). Check-in records are
//! followed by their comment lines and a sentinel line closing the comment.
//! Other events may or may not carry a comment block; it is skipped either way.
//! Anything that does not fit this shape aborts the fetch: a silently
//! skipped record would leave a hole in the reconstructed history.

use std::iter::Peekable;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{ElementKind, Version, relative_to};
use crate::source::{HistoryQuery, HistorySource};

/// Line that closes a check-in comment unless configured otherwise.
pub const DEFAULT_COMMENT_SENTINEL: &str = "_END_OF_COMMENT_";

const CHECKIN: &str = "checkin";

const DATE_FORMATS: &[&str] = &[
    "%Y%m%d %H%M%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Runs history queries below one root and turns the output into versions.
pub struct HistoryFetcher<'a> {
    source: &'a dyn HistorySource,
    root: String,
    sentinel: String,
}

impl<'a> HistoryFetcher<'a> {
    pub fn new(source: &'a dyn HistorySource, root: impl Into<String>) -> Self {
        let root: String = root.into();
        let trimmed = root.trim_end_matches('/');
        Self {
            source,
            root: if trimmed.is_empty() && !root.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            },
            sentinel: DEFAULT_COMMENT_SENTINEL.to_string(),
        }
    }

    /// Use a different comment sentinel line.
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn source(&self) -> &'a dyn HistorySource {
        self.source
    }

    /// Output format handed to the history tool.
    pub fn format(&self) -> String {
        format!("%Nd\\t%o\\t%u\\t%En\\t%n\\n%c\\n{}\\n", self.sentinel)
    }

    /// Fetch the check-ins of every file, then every directory, below the root.
    ///
    /// Versions come back in tool output order, not sorted by date.
    pub fn fetch(
        &self,
        branch: Option<&str>,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<Version>> {
        let format = self.format();
        let mut versions = Vec::new();
        for kind in [ElementKind::File, ElementKind::Directory] {
            let query = HistoryQuery {
                root: &self.root,
                kind,
                branch,
                since,
                format: &format,
            };
            let output = self.source.history(&query)?;
            let parsed = parse_history(&output, &self.root, kind, &self.sentinel)?;
            debug!(?kind, count = parsed.len(), "fetched history");
            versions.extend(parsed);
        }
        Ok(versions)
    }

    /// Fetch the check-ins of the single element named by `full_path`.
    pub fn fetch_single_element_history(&self, full_path: &str) -> Result<Vec<Version>> {
        let output = self.source.element_history(full_path, &self.format())?;
        parse_history(&output, &self.root, ElementKind::File, &self.sentinel)
    }
}

/// Parse history output into versions, keeping only check-ins.
pub fn parse_history(
    output: &str,
    root: &str,
    kind: ElementKind,
    sentinel: &str,
) -> Result<Vec<Version>> {
    let mut versions = Vec::new();
    let mut lines = output.lines().enumerate().peekable();

    while let Some((idx, line)) = lines.next() {
        let line_no = idx + 1;
        if line.is_empty() || line == sentinel {
            continue;
        }

        let fields: Vec<&str> = line.splitn(5, '\t').collect();
        let &[date, action, user, element_id, path] = fields.as_slice() else {
            return Err(malformed(
                line_no,
                format!("expected 5 tab-separated fields, found {}", fields.len()),
            ));
        };

        if action != CHECKIN {
            skip_comment(&mut lines, sentinel);
            continue;
        }

        let date = parse_timestamp(date)
            .ok_or_else(|| malformed(line_no, format!("unparsable date {date:?}")))?;
        if user.is_empty() || element_id.is_empty() || path.is_empty() {
            return Err(malformed(line_no, "empty field".to_string()));
        }
        let relative_path = relative_to(root, path)
            .ok_or_else(|| malformed(line_no, format!("{path:?} is not below {root:?}")))?;

        let mut comment = Vec::new();
        loop {
            match lines.next() {
                Some((_, l)) if l == sentinel => break,
                Some((_, l)) => comment.push(l),
                None => {
                    return Err(malformed(line_no, "comment is not terminated".to_string()));
                }
            }
        }

        versions.push(Version {
            date,
            user: user.to_string(),
            element_id: element_id.to_string(),
            full_path: path.to_string(),
            relative_path,
            comment: comment.join("\n"),
            kind,
        });
    }

    Ok(versions)
}

/// Skip the comment block of a non-checkin record, if it has one.
///
/// The block ends at the sentinel, or just before the next line that is
/// itself a record.
fn skip_comment<'o, I>(lines: &mut Peekable<I>, sentinel: &str)
where
    I: Iterator<Item = (usize, &'o str)>,
{
    while let Some(&(_, line)) = lines.peek() {
        if looks_like_record(line) {
            return;
        }
        lines.next();
        if line == sentinel {
            return;
        }
    }
}

fn looks_like_record(line: &str) -> bool {
    let mut fields = line.splitn(5, '\t');
    fields
        .next()
        .is_some_and(|date| parse_timestamp(date).is_some())
        && fields.count() == 4
}

/// Parse a history timestamp such as `20050315.143000`.
///
/// The period between date and time is treated as a space.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim().replace('.', " ");
    // keep the fractional part, if any, on the seconds
    let text = match text.rsplit_once(' ') {
        Some((head, frac))
            if head.contains(' ') && !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit()) =>
        {
            format!("{head}.{frac}")
        }
        _ => text.clone(),
    };
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&text, fmt).ok())
}

/// Parse a `--since` argument: any history timestamp, or a bare date.
pub fn parse_since(text: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_timestamp(text)
        .or_else(|| {
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("unrecognized timestamp {text:?}"))
}

fn malformed(line: usize, reason: String) -> Error {
    Error::MalformedHistoryRecord { line, reason }
}
