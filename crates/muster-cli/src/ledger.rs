//! Per-day attendance ledger.
//!
//! One CSV file per calendar day, `Attendance_<YYYY-MM-DD>.csv`, header
//! `Name,Time`, one `<NAME>,<HH:MM:SS>` line appended per first sighting.
//! Lines are never rewritten; a past day's file is abandoned at rollover.

use chrono::{NaiveDate, NaiveTime};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const LEDGER_HEADER: &str = "Name,Time";

/// Handle to the active day's ledger file.
///
/// After a failed create the handle stays usable but drops every append
/// until the next rollover replaces it — attendance loss is preferred
/// over terminating a live capture session.
pub struct Ledger {
    date: NaiveDate,
    path: PathBuf,
    file: Option<File>,
}

impl Ledger {
    /// Create (truncating any same-day leftover) the ledger for `date`.
    ///
    /// Never fails: on I/O error the ledger comes up in the degraded
    /// append-dropping state.
    pub fn create(dir: &Path, date: NaiveDate) -> Ledger {
        let path = dir.join(format!("Attendance_{}.csv", date.format("%Y-%m-%d")));

        let file = match File::create(&path).and_then(|mut f| {
            writeln!(f, "{LEDGER_HEADER}")?;
            f.flush()?;
            Ok(f)
        }) {
            Ok(f) => {
                tracing::info!(path = %path.display(), "attendance ledger created");
                Some(f)
            }
            Err(err) => {
                tracing::error!(
                    path = %path.display(),
                    error = %err,
                    "failed to create attendance ledger; records for this day will be dropped"
                );
                None
            }
        };

        Ledger { date, path, file }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether appends are currently being persisted.
    pub fn is_active(&self) -> bool {
        self.file.is_some()
    }

    /// Append one attendance record and flush it to disk.
    ///
    /// I/O failures are logged and the record is dropped.
    pub fn append(&mut self, name: &str, time: NaiveTime) {
        let Some(file) = self.file.as_mut() else {
            tracing::warn!(name, "ledger inactive, attendance record dropped");
            return;
        };

        let result = writeln!(file, "{name},{}", time.format("%H:%M:%S")).and_then(|_| file.flush());
        if let Err(err) = result {
            tracing::error!(name, error = %err, "failed to append attendance record");
        }
    }
}
