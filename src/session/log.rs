#![forbid(unsafe_code)]

//! Append-only log of completed work and rest intervals.
//!
//! CSV with a fixed header, one row per interval, timestamps truncated to
//! minute precision. Rows are only ever appended; a crash can at worst lose
//! the row being written, never rewrite history.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use time::OffsetDateTime;
use time::macros::format_description;

/// Sentinel identifier for rest intervals.
pub const BREAK_SENTINEL: &str = "break";

const HEADER: [&str; 5] = ["To-Do ID (tdid)", "start", "end", "duration", "endpoint"];

const MINUTE_FMT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");

#[derive(Debug, Clone)]
pub struct CycleRecord {
    pub tdid: String,
    pub start: OffsetDateTime,
    pub stop: OffsetDateTime,
    pub duration_secs: u64,
    pub endpoint: String,
}

impl CycleRecord {
    #[must_use]
    pub fn rest(start: OffsetDateTime, stop: OffsetDateTime, duration_secs: u64) -> Self {
        Self {
            tdid: BREAK_SENTINEL.to_owned(),
            start,
            stop,
            duration_secs,
            endpoint: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &CycleRecord) -> anyhow::Result<()> {
        let fresh = !self.path.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;

        let mut wtr = csv::Writer::from_writer(file);
        if fresh {
            wtr.write_record(HEADER)?;
        }
        let start = minute_stamp(record.start)?;
        let stop = minute_stamp(record.stop)?;
        let duration = record.duration_secs.to_string();
        wtr.write_record([
            record.tdid.as_str(),
            start.as_str(),
            stop.as_str(),
            duration.as_str(),
            record.endpoint.as_str(),
        ])?;
        wtr.flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(())
    }
}

fn minute_stamp(t: OffsetDateTime) -> anyhow::Result<String> {
    t.format(&MINUTE_FMT)
        .context("failed to format log timestamp")
}
