#![forbid(unsafe_code)]

//! Primary/temp store handling for the master collection.
//!
//! The temp store is the crash-safety checkpoint: written after every cycle,
//! removed only on clean shutdown, so its presence at startup means the
//! previous run died and it holds the freshest state. All writes stage to a
//! sibling file and rename into place; the stores are never truncated
//! in-place.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::todo::codec;
use crate::todo::model::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Primary,
    Recovered,
}

#[derive(Debug, Clone)]
pub struct TodoStore {
    primary: PathBuf,
    temp: PathBuf,
}

const SECONDS_FMT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

impl TodoStore {
    #[must_use]
    pub fn new(primary: PathBuf, temp: PathBuf) -> Self {
        Self { primary, temp }
    }

    #[must_use]
    pub fn primary(&self) -> &Path {
        &self.primary
    }

    #[must_use]
    pub fn temp(&self) -> &Path {
        &self.temp
    }

    /// Load the master collection. The temp store takes precedence: it only
    /// exists if a previous run did not shut down cleanly.
    pub fn load(&self) -> anyhow::Result<(Vec<Task>, LoadSource)> {
        if self.temp.exists() {
            return Ok((read_tasks(&self.temp)?, LoadSource::Recovered));
        }
        if self.primary.exists() {
            return Ok((read_tasks(&self.primary)?, LoadSource::Primary));
        }
        Ok((Vec::new(), LoadSource::Primary))
    }

    /// Rename the primary store to a timestamped backup. Skipped when there
    /// is no primary store yet.
    pub fn backup_primary(&self, now: OffsetDateTime) -> anyhow::Result<Option<PathBuf>> {
        if !self.primary.exists() {
            return Ok(None);
        }
        let backup = self.backup_path(now)?;
        std::fs::rename(&self.primary, &backup).with_context(|| {
            format!(
                "failed to rename {} -> {}",
                self.primary.display(),
                backup.display()
            )
        })?;
        Ok(Some(backup))
    }

    fn backup_path(&self, now: OffsetDateTime) -> anyhow::Result<PathBuf> {
        let stamped = now
            .format(&SECONDS_FMT)
            .context("failed to format backup timestamp")?;
        let digits = regex::Regex::new(r"\D+")
            .context("failed to compile backup timestamp pattern")?
            .replace_all(&stamped, "");
        let stem = self
            .primary
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "todo".to_owned());
        Ok(self.primary.with_file_name(format!("{stem}_{digits}.bak")))
    }

    /// Write the full collection to the temp store.
    pub fn checkpoint(&self, tasks: &[Task]) -> anyhow::Result<()> {
        atomic_write(&self.temp, &codec::encode_document(tasks))
    }

    /// Write the full collection to the primary store and clear the temp
    /// store, marking this run as cleanly completed.
    pub fn commit(&self, tasks: &[Task]) -> anyhow::Result<()> {
        atomic_write(&self.primary, &codec::encode_document(tasks))?;
        if self.temp.exists() {
            std::fs::remove_file(&self.temp)
                .with_context(|| format!("failed to remove {}", self.temp.display()))?;
        }
        Ok(())
    }
}

fn read_tasks(path: &Path) -> anyhow::Result<Vec<Task>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(codec::parse_document(&raw))
}

fn atomic_write(path: &Path, contents: &str) -> anyhow::Result<()> {
    let staged = staged_path(path);
    std::fs::write(&staged, contents)
        .with_context(|| format!("failed to write {}", staged.display()))?;
    std::fs::rename(&staged, path).with_context(|| {
        format!("failed to rename {} -> {}", staged.display(), path.display())
    })?;
    Ok(())
}

fn staged_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, OsString::from);
    name.push(".staged");
    path.with_file_name(name)
}
