//! Timestamped archive files.
//!
//! Names look like `backup20240131235959.xml`. The zero padding keeps a plain
//! lexicographic sort in creation order at one second resolution. Two backups
//! in the same second share a name and the later one replaces the earlier.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rand::{thread_rng, Rng};

use crate::error::AutobakError;

pub const BACKUP_PREFIX: &str = "backup";
pub const DEFAULT_EXTENSION: &str = "xml";

#[derive(Debug, Clone)]
pub struct BackupWriter {
    dir: PathBuf,
    extension: String,
}

impl BackupWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_extension(dir, DEFAULT_EXTENSION)
    }

    pub fn with_extension(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Idempotent; called once at startup.
    pub fn ensure_dir(&self) -> crate::Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn file_name(&self, timestamp: NaiveDateTime) -> String {
        format!(
            "{}{}.{}",
            BACKUP_PREFIX,
            timestamp.format("%Y%m%d%H%M%S"),
            self.extension
        )
    }

    /// Write `content` to the archive named after `timestamp` and return its
    /// file name. Failures are returned as-is; nothing is retried here.
    pub fn write(&self, content: &[u8], timestamp: NaiveDateTime) -> crate::Result<String> {
        let name = self.file_name(timestamp);
        let path = self.dir.join(&name);
        atomic_write(&path, content)
            .map_err(|source| AutobakError::ArchiveWrite { path, source })?;
        Ok(name)
    }

    /// Existing archives, oldest first.
    pub fn list(&self) -> crate::Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/{}*.{}",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            BACKUP_PREFIX,
            glob::Pattern::escape(&self.extension)
        );
        let entries = glob::glob(&pattern).map_err(|e| AutobakError::Unknown(e.to_string()))?;

        let mut paths: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).filter(|p| p.is_file()).collect();
        paths.sort();
        Ok(paths)
    }
}

// Write to a temporary sibling and rename into place so a reader never sees a
// half-written archive.
fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "archive path has no parent"))?;
    let suffix: u64 = thread_rng().gen();
    let tmp = parent.join(format!(".tmp_autobak.{}.tmp", suffix));

    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
