//! Coalescing check-ins into logical changesets.
//!
//! The history tool has no notion of a commit. Check-ins by the same user
//! with the same comment, made within a few minutes of each other, are taken
//! to be one.

use chrono::{NaiveDateTime, TimeDelta};

use crate::model::Checkin;

/// Default proximity window, in seconds.
pub const DEFAULT_WINDOW_SECS: i64 = 300;

/// Check-ins believed to form one logical commit.
#[derive(Debug, Clone)]
pub struct ChangeSet<T> {
    user: String,
    comment: String,
    checkins: Vec<T>,
}

impl<T: Checkin> ChangeSet<T> {
    fn new(checkin: T) -> Self {
        Self {
            user: checkin.user().to_string(),
            comment: checkin.comment().to_string(),
            checkins: vec![checkin],
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Members in the order they were added.
    pub fn checkins(&self) -> &[T] {
        &self.checkins
    }

    /// Date of the first member added.
    pub fn date(&self) -> NaiveDateTime {
        self.checkins[0].date()
    }

    /// Same author and comment, and within `window` of any member.
    fn close_enough(&self, checkin: &T, window: TimeDelta) -> bool {
        self.user == checkin.user()
            && self.comment == checkin.comment()
            && self
                .checkins
                .iter()
                .any(|c| (c.date() - checkin.date()).abs() < window)
    }
}

/// Accumulates check-ins into changesets.
pub struct ChangeSetGrouper<T> {
    window: TimeDelta,
    changesets: Vec<ChangeSet<T>>,
}

impl<T: Checkin> Default for ChangeSetGrouper<T> {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_WINDOW_SECS))
    }
}

impl<T: Checkin> ChangeSetGrouper<T> {
    pub fn new(window: TimeDelta) -> Self {
        Self {
            window,
            changesets: Vec::new(),
        }
    }

    /// Group `checkins` in one go, returning the changesets oldest first.
    pub fn group(window: TimeDelta, checkins: impl IntoIterator<Item = T>) -> Vec<ChangeSet<T>> {
        let mut grouper = Self::new(window);
        for checkin in checkins {
            grouper.add(checkin);
        }
        grouper.into_ordered()
    }

    /// Add to the first changeset, in creation order, that `checkin` is
    /// close enough to; otherwise start a new one.
    pub fn add(&mut self, checkin: T) {
        let window = self.window;
        match self
            .changesets
            .iter_mut()
            .find(|cs| cs.close_enough(&checkin, window))
        {
            Some(cs) => cs.checkins.push(checkin),
            None => self.changesets.push(ChangeSet::new(checkin)),
        }
    }

    /// Changesets in creation order.
    pub fn changesets(&self) -> &[ChangeSet<T>] {
        &self.changesets
    }

    /// All changesets, ordered by date.
    pub fn into_ordered(self) -> Vec<ChangeSet<T>> {
        let mut changesets = self.changesets;
        changesets.sort_by_key(|cs| cs.date());
        changesets
    }
}
