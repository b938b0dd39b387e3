//! JSON Lines journal file
//!
//! One [`JournalEntry`] per line. The file is only ever appended to; loading
//! returns raw entries and leaves verification to the ledger or auditor.
//!
//! Writers serialize through a `<journal>.lock` file created with
//! `create_new`; it exists exactly while a [`JournalLock`] is alive.

use crate::error::CliError;
use cardbook_core::JournalEntry;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_POLL: Duration = Duration::from_millis(10);

/// Append-only journal file on local disk
#[derive(Debug, Clone)]
pub struct JournalFile {
    path: PathBuf,
}

impl JournalFile {
    /// Journal at `path`; the file is created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the writer lock file
    pub fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Take the writer lock without waiting
    ///
    /// # Errors
    ///
    /// [`CliError::JournalLocked`] if another writer holds it,
    /// [`CliError::FileSystem`] on any other failure.
    pub fn try_lock(&self) -> Result<JournalLock, CliError> {
        let path = self.lock_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::FileSystem(format!("Failed to create journal directory: {e}"))
            })?;
        }

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Holder pid, for whoever finds a stale lock.
                let _ = writeln!(file, "{}", std::process::id());
                tracing::debug!(path = %path.display(), "journal lock taken");
                Ok(JournalLock { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(CliError::JournalLocked(path.display().to_string()))
            }
            Err(e) => Err(CliError::FileSystem(format!(
                "Failed to create journal lock {}: {e}",
                path.display()
            ))),
        }
    }

    /// Take the writer lock, polling for up to `wait`
    ///
    /// # Errors
    ///
    /// [`CliError::JournalLocked`] if it is still held after `wait`,
    /// [`CliError::FileSystem`] on any other failure.
    pub fn lock(&self, wait: Duration) -> Result<JournalLock, CliError> {
        let deadline = Instant::now() + wait;
        loop {
            match self.try_lock() {
                Err(CliError::JournalLocked(holder)) => {
                    if Instant::now() >= deadline {
                        tracing::warn!(lock = %holder, "gave up waiting for journal lock");
                        return Err(CliError::JournalLocked(holder));
                    }
                    std::thread::sleep(LOCK_POLL);
                }
                taken => return taken,
            }
        }
    }

    /// Read every entry; a missing file is an empty journal
    ///
    /// # Errors
    ///
    /// [`CliError::FileSystem`] on read failure, [`CliError::Serialization`]
    /// naming the first malformed line.
    pub fn load(&self) -> Result<Vec<JournalEntry>, CliError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).map_err(|e| {
            CliError::FileSystem(format!(
                "Failed to open journal {}: {e}",
                self.path.display()
            ))
        })?;

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                CliError::FileSystem(format!(
                    "Failed to read journal {}: {e}",
                    self.path.display()
                ))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|e| {
                CliError::Serialization(format!("Malformed journal line {}: {e}", index + 1))
            })?;
            entries.push(entry);
        }
        tracing::debug!(path = %self.path.display(), entries = entries.len(), "journal loaded");
        Ok(entries)
    }

    /// Append one entry as a single line
    ///
    /// # Errors
    ///
    /// [`CliError::Serialization`] or [`CliError::FileSystem`].
    pub fn append(&self, entry: &JournalEntry) -> Result<(), CliError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::FileSystem(format!("Failed to create journal directory: {e}"))
            })?;
        }

        let mut line = serde_json::to_string(entry)
            .map_err(|e| CliError::Serialization(format!("Failed to encode entry: {e}")))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                CliError::FileSystem(format!(
                    "Failed to open journal {}: {e}",
                    self.path.display()
                ))
            })?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.sync_data())
            .map_err(|e| CliError::FileSystem(format!("Failed to append to journal: {e}")))
    }
}

/// Exclusive right to append to a journal; released on drop
#[derive(Debug)]
pub struct JournalLock {
    path: PathBuf,
}

impl Drop for JournalLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release journal lock");
        }
    }
}
