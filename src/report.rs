//! Rendering grouped changes for people and for tools.

use std::io::{self, Write};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::changeset::ChangeSet;
use crate::model::{Change, ChangeKind, Version};

/// Print each changeset as a header line followed by one line per change.
///
/// ```text
/// alice 2005-03-15 14:30:00 "fix parser"
///   A src/lexer.c  /vobs/p/src/lexer.c@@/main/1
///   D src/old.c
/// ```
pub fn write_text(out: &mut impl Write, changesets: &[ChangeSet<Change>]) -> io::Result<()> {
    for cs in changesets {
        writeln!(out, "{} {} {:?}", cs.user(), cs.date(), cs.comment())?;
        for change in cs.checkins() {
            match change.content_version() {
                Some(content) => writeln!(
                    out,
                    "  {} {}  {}",
                    change.kind().letter(),
                    change.relative_path(),
                    content.full_path
                )?,
                None => writeln!(out, "  {} {}", change.kind().letter(), change.relative_path())?,
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ChangeSetReport<'a> {
    user: &'a str,
    comment: &'a str,
    date: NaiveDateTime,
    changes: Vec<ChangeReport<'a>>,
}

#[derive(Serialize)]
struct ChangeReport<'a> {
    kind: ChangeKind,
    path: &'a str,
    causing: &'a Version,
    content: Option<&'a Version>,
}

/// Print the changesets as a pretty JSON array.
pub fn write_json(out: &mut impl Write, changesets: &[ChangeSet<Change>]) -> io::Result<()> {
    let reports: Vec<ChangeSetReport<'_>> = changesets
        .iter()
        .map(|cs| ChangeSetReport {
            user: cs.user(),
            comment: cs.comment(),
            date: cs.date(),
            changes: cs
                .checkins()
                .iter()
                .map(|c| ChangeReport {
                    kind: c.kind(),
                    path: c.relative_path(),
                    causing: c.causing_version(),
                    content: c.content_version(),
                })
                .collect(),
        })
        .collect();

    serde_json::to_writer_pretty(&mut *out, &reports)?;
    writeln!(out)
}
