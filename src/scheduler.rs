//! Dual-interval autosave/backup state machine.
//!
//! Every tick counts the autosave timer down. When it expires the host is asked
//! to save its working file, and if backups are enabled a backup becomes
//! pending. A pending backup either spends one cycle of the backup counter or,
//! once the counter is down to 1, is attempted. A failed attempt stays pending
//! and is resolved again on the next tick.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Configuration;
use crate::error::AutobakError;
use crate::tracker::ChangeTracker;
use crate::writer::BackupWriter;

/// Asks the owner of the working file to persist its current state there.
/// Fire-and-forget: the scheduler never inspects the outcome.
pub trait SaveTrigger {
    fn trigger_save(&mut self);
}

impl<F: FnMut()> SaveTrigger for F {
    fn trigger_save(&mut self) {
        self()
    }
}

/// Wall-clock source for archive names.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

impl<F: Fn() -> NaiveDateTime> Clock for F {
    fn now(&self) -> NaiveDateTime {
        self()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// A new archive was written under this file name.
    Written(String),
    /// Content matched the last backup; nothing written.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SchedulerState {
    pub time_to_next_autosave: f64,
    pub cycles_to_next_backup: i32,
    pub backup_pending: bool,
    pub backups_enabled: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub autosaves: u64,
    pub attempts: u64,
    pub written: u64,
    pub unchanged: u64,
    pub failed: u64,
}

pub struct AutosaveScheduler<T, C = LocalClock> {
    config: Configuration,
    state: SchedulerState,
    stats: SchedulerStats,
    working_file: PathBuf,
    tracker: ChangeTracker,
    writer: BackupWriter,
    trigger: T,
    clock: C,
}

impl<T: SaveTrigger> AutosaveScheduler<T, LocalClock> {
    pub fn new(config: Configuration, working_file: impl Into<PathBuf>, writer: BackupWriter, trigger: T) -> Self {
        Self::with_clock(config, working_file, writer, trigger, LocalClock)
    }
}

impl<T: SaveTrigger, C: Clock> AutosaveScheduler<T, C> {
    pub fn with_clock(
        config: Configuration,
        working_file: impl Into<PathBuf>,
        writer: BackupWriter,
        trigger: T,
        clock: C,
    ) -> Self {
        let config = config.clamped();
        Self {
            state: SchedulerState {
                time_to_next_autosave: config.autosave_interval_secs,
                cycles_to_next_backup: config.backup_interval_cycles,
                backup_pending: false,
                backups_enabled: config.backups_enabled(),
            },
            stats: SchedulerStats::default(),
            config,
            working_file: working_file.into(),
            tracker: ChangeTracker::new(),
            writer,
            trigger,
            clock,
        }
    }

    /// Create the archive directory and, with backups enabled, snapshot
    /// whatever the working file already holds from a previous session.
    pub fn start(&mut self) {
        if let Err(e) = self.writer.ensure_dir() {
            error!("Cannot create archive directory {}: {}", self.writer.dir().display(), e);
        }
        if self.state.backups_enabled {
            let _ = self.attempt_backup();
        }
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.state.time_to_next_autosave -= elapsed.as_secs_f64();
        if self.state.time_to_next_autosave <= 0.0 {
            self.trigger.trigger_save();
            self.stats.autosaves += 1;
            self.state.backup_pending = self.state.backups_enabled;
            self.state.time_to_next_autosave = self.config.autosave_interval_secs;
            info!("Autosaved to working file.");
        }

        if self.state.backup_pending {
            if self.state.cycles_to_next_backup > 1 {
                // Spend the cycle; the next autosave re-arms the request.
                self.state.cycles_to_next_backup -= 1;
                self.state.backup_pending = false;
                debug!("{} autosave cycles until next backup", self.state.cycles_to_next_backup);
            } else {
                self.state.backup_pending = self.attempt_backup().is_err();
                self.state.cycles_to_next_backup = self.config.backup_interval_cycles;
            }
        }
    }

    /// Read the working file and archive it if it differs from the last backup.
    /// Also the on-demand "backup now" entry point.
    pub fn attempt_backup(&mut self) -> crate::Result<BackupOutcome> {
        self.stats.attempts += 1;
        match self.try_backup() {
            Ok(BackupOutcome::Written(name)) => {
                self.stats.written += 1;
                info!("Backup written: {}", name);
                Ok(BackupOutcome::Written(name))
            }
            Ok(BackupOutcome::Unchanged) => {
                self.stats.unchanged += 1;
                info!("No backup written: working file is the same as the previous backup in this session.");
                Ok(BackupOutcome::Unchanged)
            }
            Err(e) => {
                self.stats.failed += 1;
                if e.is_retryable() {
                    warn!("Cannot make a backup now, will retry next cycle: {}", e);
                } else {
                    error!("Backup failed: {}", e);
                }
                Err(e)
            }
        }
    }

    fn try_backup(&mut self) -> crate::Result<BackupOutcome> {
        let content = fs::read(&self.working_file).map_err(|source| AutobakError::WorkingFileRead {
            path: self.working_file.clone(),
            source,
        })?;

        if !self.tracker.has_changed(&content) {
            return Ok(BackupOutcome::Unchanged);
        }

        let name = self.writer.write(&content, self.clock.now())?;
        self.tracker.accept(content);
        Ok(BackupOutcome::Written(name))
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn config(&self) -> Configuration {
        self.config
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn writer(&self) -> &BackupWriter {
        &self.writer
    }

    pub fn working_file(&self) -> &Path {
        &self.working_file
    }
}
