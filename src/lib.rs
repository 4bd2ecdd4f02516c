//! ccreplay: Rebuild commit-shaped history from ClearCase element history.
//!
//! ClearCase records history per element: every file and directory has its
//! own chain of versions, and nothing ties the versions of one logical change
//! together. ccreplay turns that into an ordered stream of path-level changes
//! and groups them into changesets that can be replayed as git commits.
//!
//! # Architecture
//!
//! - **History**: Query per-element history and parse it into versions
//! - **Dirdiff**: Turn directory versions into added and removed names
//! - **Lineage**: Find the content behind an addition the scan never saw
//! - **Reconstruct**: Merge it all into one ordered change stream
//! - **Changeset**: Group check-ins by author, comment and time proximity
//! - **Replay**: Commit the changesets to a git repository

pub mod changeset;
pub mod cleartool;
pub mod config;
pub mod dirdiff;
mod error;
pub mod git;
pub mod history;
pub mod lineage;
pub mod model;
pub mod reconstruct;
pub mod replay;
pub mod report;
pub mod source;

pub use changeset::{ChangeSet, ChangeSetGrouper};
pub use cleartool::Cleartool;
pub use config::Config;
pub use error::{Error, Result};
pub use history::HistoryFetcher;
pub use model::{Change, ChangeKind, Checkin, ElementKind, Version};
pub use reconstruct::ChangeReconstructor;
pub use replay::{ReplaySummary, replay};
pub use source::{HistoryQuery, HistorySource};
