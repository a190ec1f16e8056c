//! Append-only CSV log of finished sessions.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::session::SessionResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: DateTime<Local>,
    pub duration_secs: u32,
    pub correct_answers: u32,
    pub total_problems: u32,
    pub time_remaining: u32,
    pub skipped: bool,
    pub mistakes: usize,
}

impl HistoryRecord {
    pub fn new(result: &SessionResult, duration_secs: u32, mistakes: usize) -> Self {
        Self {
            date: Local::now(),
            duration_secs,
            correct_answers: result.correct_answers,
            total_problems: result.total_problems,
            time_remaining: result.time_remaining,
            skipped: result.skipped,
            mistakes,
        }
    }

    /// Correct answers as a rounded percentage of answered problems.
    pub fn accuracy(&self) -> f64 {
        if self.total_problems == 0 {
            return 0.0;
        }
        (self.correct_answers as f64 / self.total_problems as f64 * 100.0).round()
    }
}

#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append one record, writing the header only when the file is new.
    pub fn append(&self, record: &HistoryRecord) -> Result<(), csv::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// All records, oldest first. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<HistoryRecord>, csv::Error> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        csv::Reader::from_path(&self.path)?
            .deserialize()
            .collect()
    }

    /// Most correct answers in any session that was played to the end.
    pub fn best(&self) -> Option<u32> {
        self.load()
            .ok()?
            .into_iter()
            .filter(|r| !r.skipped)
            .map(|r| r.correct_answers)
            .max()
    }
}
