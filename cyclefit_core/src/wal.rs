//! Write-Ahead Log (WAL) of period-start changes.
//!
//! Every logged or removed start is appended to a JSONL (JSON Lines) file
//! with file locking. The period history is rebuilt by replaying the log.

use crate::{PeriodHistory, Result};
use chrono::{DateTime, NaiveDate, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// A change to the set of period start dates
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodEvent {
    Logged { date: NaiveDate },
    Removed { date: NaiveDate },
}

/// One line of the log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PeriodLogEntry {
    pub recorded_at: DateTime<Utc>,
    pub event: PeriodEvent,
}

impl PeriodLogEntry {
    /// Entry stamped with the current time
    pub fn now(event: PeriodEvent) -> Self {
        Self {
            recorded_at: Utc::now(),
            event,
        }
    }
}

/// Destination for period log entries
pub trait PeriodSink {
    fn append(&mut self, entry: &PeriodLogEntry) -> Result<()>;
}

/// JSONL-based period sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl PeriodSink for JsonlSink {
    fn append(&mut self, entry: &PeriodLogEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended {:?} to period log", entry.event);
        Ok(())
    }
}

/// Read all entries from a WAL file
///
/// Corrupted lines are skipped with a warning.
pub fn read_entries(path: &Path) -> Result<Vec<PeriodLogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<PeriodLogEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse period log line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} entries from period log", entries.len());
    Ok(entries)
}

/// Fold entries, in log order, into the resulting history
pub fn replay(entries: &[PeriodLogEntry]) -> PeriodHistory {
    let mut history = PeriodHistory::new();

    for entry in entries {
        match entry.event {
            PeriodEvent::Logged { date } => {
                history.insert(date);
            }
            PeriodEvent::Removed { date } => {
                history.remove(date);
            }
        }
    }

    history
}

/// Rebuild the period history from the log at `path`
pub fn load_history(path: &Path) -> Result<PeriodHistory> {
    let entries = read_entries(path)?;
    Ok(replay(&entries))
}
