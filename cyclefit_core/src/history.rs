//! Period-start history.
//!
//! The history is an ordered, de-duplicated set of period start dates.
//! Every derived calculation reads it in ascending order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Chronologically sorted, unique period start dates for one user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodHistory {
    starts: BTreeSet<NaiveDate>,
}

impl PeriodHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from dates in any order, dropping duplicates
    pub fn from_dates<I>(dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            starts: dates.into_iter().collect(),
        }
    }

    /// Add a start date, returning `false` if it was already logged
    pub fn insert(&mut self, date: NaiveDate) -> bool {
        self.starts.insert(date)
    }

    /// Remove a start date, returning `false` if it was not logged
    pub fn remove(&mut self, date: NaiveDate) -> bool {
        self.starts.remove(&date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.starts.contains(&date)
    }

    /// Start dates in ascending order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.starts.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.starts.iter().copied()
    }

    /// Most recent start date
    pub fn last(&self) -> Option<NaiveDate> {
        self.starts.iter().next_back().copied()
    }

    /// Most recent start date that is not after `date`
    pub fn last_on_or_before(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.starts.range(..=date).next_back().copied()
    }

    /// History as it looked on `date`, ignoring later starts
    pub fn as_of(&self, date: NaiveDate) -> Self {
        Self {
            starts: self.starts.range(..=date).copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}
