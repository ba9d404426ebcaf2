//! Interval settings file.
//!
//! The file is plain text: line 1 holds the autosave period in seconds, line 2
//! the backup period in autosave cycles, and everything after that is free-form
//! documentation for whoever edits it by hand.
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::AutobakError;

pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: f64 = 300.0;
pub const DEFAULT_BACKUP_INTERVAL_CYCLES: i32 = 1;
/// Smaller autosave periods are raised to this after loading.
pub const MIN_AUTOSAVE_INTERVAL_SECS: f64 = 15.0;

const DOCUMENTATION: &[&str] = &[
    "\n* In the first line, enter the autosave period in seconds [float].",
    "    - The minimum period is 15 seconds. Smaller numbers are increased to the minimum.",
    "\n* In the second line, enter the backup period in autosave cycles [int].",
    "    - Zero or a negative number will disable auto backups.",
    "\n* Close this file before starting the autosave service.",
    "\n* Delete this file and restart to restore default settings.",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Configuration {
    pub autosave_interval_secs: f64,
    pub backup_interval_cycles: i32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            backup_interval_cycles: DEFAULT_BACKUP_INTERVAL_CYCLES,
        }
    }
}

impl Configuration {
    /// Parse the two leading value lines. Trailing lines are ignored.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let mut lines = text.lines();

        let autosave_line = lines
            .next()
            .ok_or_else(|| AutobakError::ConfigParse("missing autosave interval (line 1)".to_string()))?;
        let autosave_interval_secs: f64 = autosave_line.trim().parse().map_err(|e| {
            AutobakError::ConfigParse(format!("line 1 {:?} is not a number: {}", autosave_line, e))
        })?;
        if !autosave_interval_secs.is_finite() {
            return Err(AutobakError::ConfigParse(format!(
                "line 1 {:?} is not a finite number",
                autosave_line
            )));
        }

        let cycles_line = lines
            .next()
            .ok_or_else(|| AutobakError::ConfigParse("missing backup interval (line 2)".to_string()))?;
        let backup_interval_cycles: i32 = cycles_line.trim().parse().map_err(|e| {
            AutobakError::ConfigParse(format!("line 2 {:?} is not an integer: {}", cycles_line, e))
        })?;

        Ok(Self {
            autosave_interval_secs,
            backup_interval_cycles,
        })
    }

    /// Copy with the autosave period raised to the 15 second floor.
    pub fn clamped(self) -> Self {
        Self {
            autosave_interval_secs: self.autosave_interval_secs.max(MIN_AUTOSAVE_INTERVAL_SECS),
            ..self
        }
    }

    pub fn backups_enabled(&self) -> bool {
        self.backup_interval_cycles >= 1
    }

    /// Deterministic on-disk rendering: both values, then the documentation block.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n{}\n", self.autosave_interval_secs, self.backup_interval_cycles);
        for line in DOCUMENTATION {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the effective configuration. Never fails: a missing file is seeded
    /// with defaults, and an unreadable or malformed one falls back to defaults
    /// for this session without being touched.
    pub fn load(&self) -> Configuration {
        let loaded = if self.path.exists() {
            match self.read() {
                Ok(config) => config,
                Err(e) => {
                    error!("{}", e);
                    warn!(
                        "Exception when loading settings file {}. Please delete or repair it. Initialized with default values.",
                        self.path.display()
                    );
                    Configuration::default()
                }
            }
        } else {
            let defaults = Configuration::default();
            match self.save(defaults.autosave_interval_secs, defaults.backup_interval_cycles) {
                Ok(()) => warn!(
                    "Settings file not found. New settings file created at {}. Initialized with default values.",
                    self.path.display()
                ),
                Err(e) => error!("Could not create settings file: {}", e),
            }
            defaults
        };

        let config = loaded.clamped();
        info!(
            "Loaded settings file. Autosave every {} seconds. Back up every {} cycles.",
            config.autosave_interval_secs, config.backup_interval_cycles
        );
        config
    }

    fn read(&self) -> crate::Result<Configuration> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| AutobakError::ConfigParse(format!("cannot read {}: {}", self.path.display(), e)))?;
        Configuration::parse(&text)
    }

    /// Write the two values followed by the documentation text. Only used to
    /// seed a missing file; runtime clamping is never persisted.
    pub fn save(&self, autosave_interval_secs: f64, backup_interval_cycles: i32) -> crate::Result<()> {
        let config = Configuration {
            autosave_interval_secs,
            backup_interval_cycles,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AutobakError::ConfigIo(e.to_string()))?;
        }
        let mut file = fs::File::create(&self.path).map_err(|e| AutobakError::ConfigIo(e.to_string()))?;
        file.write_all(config.render().as_bytes())
            .map_err(|e| AutobakError::ConfigIo(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_seeded_with_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("nested").join("INTERVAL.TXT");
        let store = ConfigStore::new(&path);

        let config = store.load();
        assert_eq!(config, Configuration { autosave_interval_secs: 300.0, backup_interval_cycles: 1 });

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("300"));
        assert_eq!(lines.next(), Some("1"));
        assert!(text.contains("Zero or a negative number will disable auto backups."));
    }

    #[test]
    fn test_second_load_does_not_rewrite() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("INTERVAL.TXT");
        let store = ConfigStore::new(&path);
        store.load();

        // Mark the file so a rewrite would be visible.
        let marked = format!("{}* operator note\n", fs::read_to_string(&path).unwrap());
        fs::write(&path, &marked).unwrap();

        let config = store.load();
        assert_eq!(config, Configuration::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), marked);
    }

    #[test]
    fn test_small_interval_is_clamped_but_not_persisted() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("INTERVAL.TXT");
        fs::write(&path, "10\n0\n").unwrap();

        let config = ConfigStore::new(&path).load();
        assert_eq!(config.autosave_interval_secs, MIN_AUTOSAVE_INTERVAL_SECS);
        assert_eq!(config.backup_interval_cycles, 0);
        assert!(!config.backups_enabled());
        assert_eq!(fs::read_to_string(&path).unwrap(), "10\n0\n");
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("INTERVAL.TXT");

        for bad in ["abc\n2\n", "60\n", "60\nnope\n", "", "NaN\n3\n", "60\n2.5\n"] {
            fs::write(&path, bad).unwrap();
            let config = ConfigStore::new(&path).load();
            assert_eq!(config, Configuration::default(), "input {:?}", bad);
            assert_eq!(fs::read_to_string(&path).unwrap(), bad);
        }
    }

    #[test]
    fn test_parse_trims_and_ignores_trailing_lines() {
        let config = Configuration::parse("  42.5 \r\n -3\nfree text\nmore").unwrap();
        assert_eq!(config.autosave_interval_secs, 42.5);
        assert_eq!(config.backup_interval_cycles, -3);
        assert!(!config.backups_enabled());
    }

    #[test]
    fn test_serializes_for_status_output() {
        let json = serde_json::to_value(Configuration::default()).unwrap();
        assert_eq!(json["autosave_interval_secs"], 300.0);
        assert_eq!(json["backup_interval_cycles"], 1);
    }

    #[test]
    fn test_render_parses_back() {
        let config = Configuration { autosave_interval_secs: 22.5, backup_interval_cycles: 4 };
        assert_eq!(Configuration::parse(&config.render()).unwrap(), config);
    }
}
