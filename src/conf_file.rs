// Idempotent edits to PostgreSQL configuration files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfFile {
    pub path: PathBuf,
}

impl ConfFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfFile { path: path.into() }
    }

    pub fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))
    }

    pub fn contains(&self, needle: &str) -> Result<bool> {
        Ok(self.read()?.contains(needle))
    }

    /// Copies the file to `backup` unless a backup is already there.
    /// Returns whether a copy was made.
    pub fn backup_once(&self, backup: &Path) -> Result<bool> {
        if backup.exists() {
            tracing::info!(backup = %backup.display(), "backup already present");
            return Ok(false);
        }
        fs::copy(&self.path, backup).with_context(|| {
            format!(
                "failed to back up {} to {}",
                self.path.display(),
                backup.display()
            )
        })?;
        tracing::info!(backup = %backup.display(), "backed up configuration");
        Ok(true)
    }

    /// Appends `block` on its own lines, creating the file if needed.
    pub fn append(&self, block: &str) -> Result<()> {
        let needs_newline = match fs::read(&self.path) {
            Ok(existing) => !existing.is_empty() && !existing.ends_with(b"\n"),
            Err(_) => false,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {} for append", self.path.display()))?;
        let mut text = String::new();
        if needs_newline {
            text.push('\n');
        }
        text.push_str(block);
        if !block.ends_with('\n') {
            text.push('\n');
        }
        file.write_all(text.as_bytes())
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        Ok(())
    }

    /// Appends `block` unless `marker` already occurs in the file.
    /// Returns whether anything was written.
    pub fn append_unless_present(&self, marker: &str, block: &str) -> Result<bool> {
        if self.contains(marker)? {
            tracing::info!(
                file = %self.path.display(),
                "configuration already present, nothing to do"
            );
            return Ok(false);
        }
        self.append(block)?;
        tracing::info!(file = %self.path.display(), "appended configuration");
        Ok(true)
    }
}
