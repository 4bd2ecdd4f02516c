//! Finding the version behind an addition the main scan never saw.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{Error, Result};
use crate::history::HistoryFetcher;
use crate::model::Version;

/// Looks up the newest version of a directory entry that predates a cutoff.
pub struct LineageResolver<'f, 'a> {
    fetcher: &'f HistoryFetcher<'a>,
}

impl<'f, 'a> LineageResolver<'f, 'a> {
    pub fn new(fetcher: &'f HistoryFetcher<'a>) -> Self {
        Self { fetcher }
    }

    /// The most recent version of `name` inside `container_full_path`
    /// checked in strictly before `cutoff`.
    ///
    /// One single-element history query; no further search is attempted.
    pub fn resolve_add(
        &self,
        container_full_path: &str,
        name: &str,
        cutoff: NaiveDateTime,
    ) -> Result<Version> {
        let path = format!("{container_full_path}/{name}");
        let mut versions = self.fetcher.fetch_single_element_history(&path)?;
        versions.sort_by(|a, b| b.date.cmp(&a.date));

        let found = versions
            .into_iter()
            .find(|v| v.date < cutoff)
            .ok_or(Error::LineageNotFound {
                path: path.clone(),
                before: cutoff,
            })?;
        debug!(%path, version = %found.full_path, "resolved lineage");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::source::fake::{FakeSource, record};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2005, 3, 15)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .unwrap()
    }

    fn source_with(history: String) -> FakeSource {
        let mut source = FakeSource::default();
        source
            .elements
            .insert("/vobs/p@@/main/4/x.c".to_string(), history);
        source
    }

    #[test]
    fn picks_newest_version_before_cutoff() {
        let source = source_with(
            [
                record(
                    "20050315.090000",
                    "checkin",
                    "alice",
                    "x",
                    "/vobs/p/x.c@@/main/1",
                    "one",
                ),
                record(
                    "20050315.110000",
                    "checkin",
                    "alice",
                    "x",
                    "/vobs/p/x.c@@/main/2",
                    "two",
                ),
                record(
                    "20050315.130000",
                    "checkin",
                    "alice",
                    "x",
                    "/vobs/p/x.c@@/main/3",
                    "three",
                ),
            ]
            .concat(),
        );
        let fetcher = HistoryFetcher::new(&source, "/vobs/p");
        let v = LineageResolver::new(&fetcher)
            .resolve_add("/vobs/p@@/main/4", "x.c", at(12, 0))
            .unwrap();

        assert_eq!(v.full_path, "/vobs/p/x.c@@/main/2");
        assert_eq!(v.relative_path, "x.c");
        assert_eq!(source.calls(), vec!["element /vobs/p@@/main/4/x.c"]);
    }

    #[test]
    fn cutoff_is_exclusive() {
        let source = source_with(record(
            "20050315.120000",
            "checkin",
            "alice",
            "x",
            "/vobs/p/x.c@@/main/1",
            "",
        ));
        let fetcher = HistoryFetcher::new(&source, "/vobs/p");
        let err = LineageResolver::new(&fetcher)
            .resolve_add("/vobs/p@@/main/4", "x.c", at(12, 0))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::LineageNotFound { ref path, .. } if path == "/vobs/p@@/main/4/x.c"
        ));
    }

    #[test]
    fn empty_history_is_not_found() {
        let source = source_with(String::new());
        let fetcher = HistoryFetcher::new(&source, "/vobs/p");
        let err = LineageResolver::new(&fetcher)
            .resolve_add("/vobs/p@@/main/4", "x.c", at(12, 0))
            .unwrap_err();
        assert!(matches!(err, Error::LineageNotFound { .. }));
    }
}
