//! Rebuilding an ordered stream of path-level changes.
//!
//! The history tool only records "this element got a new version". A file's
//! new version is a modification of that file. A directory's new version is
//! diffed against its predecessor: every name that appeared is an addition,
//! every name that vanished a deletion. Additions are paired with the
//! version whose content they bring in, either one already seen during the
//! scan or one found by a targeted lineage lookup.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::dirdiff::DirectoryDiffResolver;
use crate::error::Result;
use crate::history::HistoryFetcher;
use crate::lineage::LineageResolver;
use crate::model::{Change, ChangeKind, Version, join_relative};

/// Drives a full reconstruction pass below one root.
pub struct ChangeReconstructor<'a> {
    fetcher: HistoryFetcher<'a>,
}

impl<'a> ChangeReconstructor<'a> {
    pub fn new(fetcher: HistoryFetcher<'a>) -> Self {
        Self { fetcher }
    }

    /// Fetch the history below the root and turn it into resolved changes,
    /// oldest first.
    ///
    /// Any error aborts the pass; no partial result is returned.
    pub fn reconstruct(
        &self,
        branch: Option<&str>,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<Change>> {
        let mut versions = self.fetcher.fetch(branch, since)?;
        // stable: same-date versions keep tool output order
        versions.sort_by_key(|v| v.date);

        let diffs = DirectoryDiffResolver::new(self.fetcher.source());
        let lineage = LineageResolver::new(&self.fetcher);
        let mut pass = Pass::default();

        for version in versions {
            pass.visit(version, &diffs, &lineage)?;
        }

        info!(
            elements = pass.by_element.len(),
            changes = pass.changes.len(),
            "reconstructed history"
        );
        Ok(pass.changes)
    }
}

/// State owned by one reconstruction pass.
#[derive(Default)]
struct Pass {
    /// Last version seen per element id
    by_element: HashMap<String, Version>,

    /// Last version seen per relative path
    by_path: HashMap<String, Version>,

    changes: Vec<Change>,
}

impl Pass {
    fn visit(
        &mut self,
        version: Version,
        diffs: &DirectoryDiffResolver<'_>,
        lineage: &LineageResolver<'_, '_>,
    ) -> Result<()> {
        self.by_element
            .insert(version.element_id.clone(), version.clone());
        self.by_path
            .insert(version.relative_path.clone(), version.clone());

        if !version.is_directory() {
            debug!(path = %version.relative_path, "modify");
            self.changes.push(Change::modify(version));
            return Ok(());
        }

        for entry in diffs.structural_changes(&version)? {
            let path = join_relative(&version.relative_path, &entry.name);
            let change = match entry.kind {
                ChangeKind::Delete => Change::delete(path, version.clone()),
                _ => {
                    let content = match self.by_path.get(&path) {
                        Some(known) => known.clone(),
                        None => lineage.resolve_add(&version.full_path, &entry.name, version.date)?,
                    };
                    Change::add(path, version.clone(), content)
                }
            };

            self.supersede_modify(change.relative_path());
            debug!(kind = ?change.kind(), path = %change.relative_path(), "structural");
            self.changes.push(change);
        }

        Ok(())
    }

    /// Drop queued plain modifications of `path`; the structural change
    /// about to be queued records the same edit.
    fn supersede_modify(&mut self, path: &str) {
        self.changes
            .retain(|c| !(c.kind() == ChangeKind::Modify && c.relative_path() == path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::fake::{FakeSource, record};

    fn reconstruct(source: &FakeSource) -> Result<Vec<Change>> {
        ChangeReconstructor::new(HistoryFetcher::new(source, "/vobs/p")).reconstruct(None, None)
    }

    fn summary(changes: &[Change]) -> Vec<(ChangeKind, &str)> {
        changes
            .iter()
            .map(|c| (c.kind(), c.relative_path()))
            .collect()
    }

    #[test]
    fn file_versions_become_modifications_in_date_order() {
        let source = FakeSource {
            files: [
                record(
                    "20050316.100000",
                    "checkin",
                    "bob",
                    "b",
                    "/vobs/p/b.c@@/main/1",
                    "",
                ),
                record(
                    "20050315.100000",
                    "checkin",
                    "alice",
                    "a",
                    "/vobs/p/a.c@@/main/1",
                    "",
                ),
            ]
            .concat(),
            ..Default::default()
        };
        let changes = reconstruct(&source).unwrap();

        assert_eq!(
            summary(&changes),
            vec![(ChangeKind::Modify, "a.c"), (ChangeKind::Modify, "b.c")]
        );
        assert_eq!(changes[0].content_version(), Some(changes[0].causing_version()));
    }

    #[test]
    fn equal_dates_keep_output_order() {
        let source = FakeSource {
            files: [
                record(
                    "20050315.100000",
                    "checkin",
                    "alice",
                    "z",
                    "/vobs/p/z.c@@/main/1",
                    "",
                ),
                record(
                    "20050315.100000",
                    "checkin",
                    "alice",
                    "a",
                    "/vobs/p/a.c@@/main/1",
                    "",
                ),
            ]
            .concat(),
            ..Default::default()
        };
        let changes = reconstruct(&source).unwrap();
        assert_eq!(
            summary(&changes),
            vec![(ChangeKind::Modify, "z.c"), (ChangeKind::Modify, "a.c")]
        );
    }

    #[test]
    fn directory_add_supersedes_pending_modify() {
        let mut source = FakeSource {
            files: record(
                "20050315.100000",
                "checkin",
                "alice",
                "x",
                "/vobs/p/src/x.c@@/main/1",
                "new x",
            ),
            directories: record(
                "20050315.100100",
                "checkin",
                "alice",
                "src",
                "/vobs/p/src@@/main/2",
                "new x",
            ),
            ..Default::default()
        };
        source.diffs.insert(
            "/vobs/p/src@@/main/2".into(),
            "> x.c  10  15-Mar-05.10:01:00\n".into(),
        );
        let changes = reconstruct(&source).unwrap();

        assert_eq!(summary(&changes), vec![(ChangeKind::Add, "src/x.c")]);
        let add = &changes[0];
        assert_eq!(add.causing_version().full_path, "/vobs/p/src@@/main/2");
        assert_eq!(
            add.content_version().map(|v| v.full_path.as_str()),
            Some("/vobs/p/src/x.c@@/main/1")
        );
        // the known version was used, no lineage query
        assert!(!source.calls().iter().any(|c| c.starts_with("element")));
    }

    #[test]
    fn unseen_addition_is_resolved_through_lineage() {
        let mut source = FakeSource {
            directories: record(
                "20050315.120000",
                "checkin",
                "alice",
                "root",
                "/vobs/p@@/main/5",
                "import",
            ),
            ..Default::default()
        };
        source.diffs.insert(
            "/vobs/p@@/main/5".into(),
            "> x  10  15-Mar-05.12:00:00\n".into(),
        );
        source.elements.insert(
            "/vobs/p@@/main/5/x".into(),
            record(
                "20050315.110000",
                "checkin",
                "alice",
                "x",
                "/vobs/p/x@@/main/1",
                "import",
            ),
        );
        let changes = reconstruct(&source).unwrap();

        assert_eq!(summary(&changes), vec![(ChangeKind::Add, "x")]);
        assert_eq!(
            changes[0].content_version().map(|v| v.full_path.as_str()),
            Some("/vobs/p/x@@/main/1")
        );
    }

    #[test]
    fn unresolvable_addition_aborts() {
        let mut source = FakeSource {
            directories: record(
                "20050315.120000",
                "checkin",
                "alice",
                "root",
                "/vobs/p@@/main/5",
                "",
            ),
            ..Default::default()
        };
        source.diffs.insert(
            "/vobs/p@@/main/5".into(),
            "> x  10  15-Mar-05.12:00:00\n".into(),
        );
        let err = reconstruct(&source).unwrap_err();
        assert!(matches!(err, Error::LineageNotFound { .. }));
    }

    #[test]
    fn deletions_carry_no_content() {
        let mut source = FakeSource {
            files: record(
                "20050315.100000",
                "checkin",
                "alice",
                "x",
                "/vobs/p/x.c@@/main/3",
                "",
            ),
            directories: record(
                "20050316.100000",
                "checkin",
                "alice",
                "root",
                "/vobs/p@@/main/9",
                "rm x",
            ),
            ..Default::default()
        };
        source.diffs.insert(
            "/vobs/p@@/main/9".into(),
            "< x.c  10  16-Mar-05.10:00:00\n".into(),
        );
        let changes = reconstruct(&source).unwrap();

        // the earlier modify of x.c was still queued, so the delete replaces it
        assert_eq!(summary(&changes), vec![(ChangeKind::Delete, "x.c")]);
        assert!(changes[0].content_version().is_none());
    }

    #[test]
    fn structural_events_are_not_coalesced_with_each_other() {
        let mut source = FakeSource {
            files: record(
                "20050314.100000",
                "checkin",
                "alice",
                "x",
                "/vobs/p/x.c@@/main/1",
                "",
            ),
            directories: [
                record(
                    "20050315.100000",
                    "checkin",
                    "alice",
                    "root",
                    "/vobs/p@@/main/2",
                    "",
                ),
                record(
                    "20050316.100000",
                    "checkin",
                    "alice",
                    "root",
                    "/vobs/p@@/main/3",
                    "",
                ),
            ]
            .concat(),
            ..Default::default()
        };
        source.diffs.insert(
            "/vobs/p@@/main/2".into(),
            "< x.c  10  15-Mar-05.10:00:00\n".into(),
        );
        source.diffs.insert(
            "/vobs/p@@/main/3".into(),
            "> x.c  10  16-Mar-05.10:00:00\n".into(),
        );
        let changes = reconstruct(&source).unwrap();

        assert_eq!(
            summary(&changes),
            vec![(ChangeKind::Delete, "x.c"), (ChangeKind::Add, "x.c")]
        );
    }

    #[test]
    fn structural_changes_follow_their_directory() {
        let mut source = FakeSource {
            files: [
                record(
                    "20050315.090000",
                    "checkin",
                    "alice",
                    "a",
                    "/vobs/p/a.c@@/main/1",
                    "",
                ),
                record(
                    "20050315.090000",
                    "checkin",
                    "alice",
                    "b",
                    "/vobs/p/b.c@@/main/1",
                    "",
                ),
                record(
                    "20050315.110000",
                    "checkin",
                    "bob",
                    "c",
                    "/vobs/p/c.c@@/main/4",
                    "",
                ),
            ]
            .concat(),
            directories: record(
                "20050315.100000",
                "checkin",
                "alice",
                "root",
                "/vobs/p@@/main/2",
                "",
            ),
            ..Default::default()
        };
        source.diffs.insert(
            "/vobs/p@@/main/2".into(),
            "> b.c  1  15-Mar-05.10:00:00\n> a.c  1  15-Mar-05.10:00:00\n".into(),
        );
        let changes = reconstruct(&source).unwrap();

        assert_eq!(
            summary(&changes),
            vec![
                (ChangeKind::Add, "b.c"),
                (ChangeKind::Add, "a.c"),
                (ChangeKind::Modify, "c.c"),
            ]
        );
        for change in &changes {
            match change.kind() {
                ChangeKind::Delete => assert!(change.content_version().is_none()),
                _ => assert!(change.content_version().is_some()),
            }
        }
    }

    #[test]
    fn sub_directory_paths_are_joined() {
        let mut source = FakeSource {
            files: record(
                "20050315.090000",
                "checkin",
                "alice",
                "h",
                "/vobs/p/inc/sys/h.h@@/main/1",
                "",
            ),
            directories: record(
                "20050315.100000",
                "checkin",
                "alice",
                "sys",
                "/vobs/p/inc/sys@@/main/2",
                "",
            ),
            ..Default::default()
        };
        source.diffs.insert(
            "/vobs/p/inc/sys@@/main/2".into(),
            "> h.h  1  15-Mar-05.10:00:00\n> gone/  0  15-Mar-05.10:00:00\n".into(),
        );
        let changes = reconstruct(&source).unwrap();
        assert_eq!(summary(&changes), vec![(ChangeKind::Add, "inc/sys/h.h")]);
    }
}
