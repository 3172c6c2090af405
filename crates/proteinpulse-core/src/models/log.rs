use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::IntakeEntry;

/// All intake entries for one calendar date, with their running total.
///
/// The total is kept consistent with the entries by every mutation and is
/// recomputed when a log is deserialized, so a hand-edited or stale total on
/// disk never leaks out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DailyLogRecord")]
pub struct DailyLog {
    date: NaiveDate,
    entries: Vec<IntakeEntry>,
    total: f64,
}

/// Persisted shape of a `DailyLog`; the stored total is ignored on load.
#[derive(Deserialize)]
struct DailyLogRecord {
    date: NaiveDate,
    #[serde(default)]
    entries: Vec<IntakeEntry>,
}

impl From<DailyLogRecord> for DailyLog {
    fn from(record: DailyLogRecord) -> Self {
        Self::from_entries(record.date, record.entries)
    }
}

impl DailyLog {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            entries: Vec::new(),
            total: 0.0,
        }
    }

    pub fn from_entries(date: NaiveDate, entries: Vec<IntakeEntry>) -> Self {
        let total = entries.iter().map(|e| e.amount).sum();
        Self { date, entries, total }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn entries(&self) -> &[IntakeEntry] {
        &self.entries
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry. Returns false (and changes nothing) if an entry with
    /// the same id is already present.
    pub fn push(&mut self, entry: IntakeEntry) -> bool {
        if self.entries.iter().any(|e| e.id == entry.id) {
            return false;
        }
        self.total += entry.amount;
        self.entries.push(entry);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<IntakeEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        let removed = self.entries.remove(index);
        // Re-sum rather than subtract so float drift cannot accumulate
        self.total = self.entries.iter().map(|e| e.amount).sum();
        Some(removed)
    }

    /// Fraction of `target` reached, capped at 1.0. A zero target counts as met.
    pub fn progress(&self, target: f64) -> f64 {
        if target <= 0.0 {
            return 1.0;
        }
        (self.total / target).min(1.0)
    }
}
