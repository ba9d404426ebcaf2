//! Operator commands accepted while the scheduler runs.
use serde::Serialize;

use crate::config::Configuration;
use crate::error::AutobakError;
use crate::scheduler::{AutosaveScheduler, BackupOutcome, Clock, SaveTrigger, SchedulerState, SchedulerStats};

pub const HELP: &str = "Commands:
  backup   attempt a backup now (alias: BackupAircraft)
  status   show timers and counters as JSON
  help     show this text
  quit     stop the scheduler";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    BackupNow,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub config: Configuration,
    pub state: SchedulerState,
    pub stats: SchedulerStats,
}

impl ConsoleCommand {
    /// Blank lines yield `None`. Command names are case-insensitive.
    pub fn parse(line: &str) -> crate::Result<Option<Self>> {
        let words = shellwords::split(line).map_err(|e| AutobakError::Console(format!("{:?}", e)))?;
        let Some(name) = words.first() else {
            return Ok(None);
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "backup" | "backupaircraft" => ConsoleCommand::BackupNow,
            "status" => ConsoleCommand::Status,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(AutobakError::Console(format!("unknown command: {}", other))),
        };
        Ok(Some(command))
    }

    pub fn execute<T: SaveTrigger, C: Clock>(&self, scheduler: &mut AutosaveScheduler<T, C>) -> crate::Result<Flow> {
        let reply = match self {
            ConsoleCommand::BackupNow => match scheduler.attempt_backup() {
                Ok(BackupOutcome::Written(name)) => format!("Backup written: {}", name),
                Ok(BackupOutcome::Unchanged) => "No backup written: content unchanged".to_string(),
                Err(e) => format!("Backup failed: {}", e),
            },
            ConsoleCommand::Status => serde_json::to_string_pretty(&StatusReport {
                config: scheduler.config(),
                state: scheduler.state(),
                stats: scheduler.stats(),
            })?,
            ConsoleCommand::Help => HELP.to_string(),
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        };
        Ok(Flow::Continue(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::BackupWriter;
    use tempfile::TempDir;

    #[test]
    fn test_parse() {
        assert_eq!(ConsoleCommand::parse("backup").unwrap(), Some(ConsoleCommand::BackupNow));
        assert_eq!(ConsoleCommand::parse("  BackupAircraft ").unwrap(), Some(ConsoleCommand::BackupNow));
        assert_eq!(ConsoleCommand::parse("STATUS").unwrap(), Some(ConsoleCommand::Status));
        assert_eq!(ConsoleCommand::parse("exit").unwrap(), Some(ConsoleCommand::Quit));
        assert_eq!(ConsoleCommand::parse("").unwrap(), None);
        assert!(ConsoleCommand::parse("rewind").is_err());
    }

    #[test]
    fn test_execute_backup_and_status() {
        let tmp_dir = TempDir::new().unwrap();
        let working = tmp_dir.path().join("work.xml");
        std::fs::write(&working, "<a/>").unwrap();
        let writer = BackupWriter::new(tmp_dir.path().join("backups"));
        writer.ensure_dir().unwrap();
        let mut scheduler = AutosaveScheduler::new(Configuration::default(), &working, writer, || {});

        let Flow::Continue(reply) = ConsoleCommand::BackupNow.execute(&mut scheduler).unwrap() else {
            panic!("backup should not quit");
        };
        assert!(reply.starts_with("Backup written: backup"));

        let Flow::Continue(reply) = ConsoleCommand::BackupNow.execute(&mut scheduler).unwrap() else {
            panic!("backup should not quit");
        };
        assert!(reply.contains("unchanged"));

        let Flow::Continue(json) = ConsoleCommand::Status.execute(&mut scheduler).unwrap() else {
            panic!("status should not quit");
        };
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stats"]["written"], 1);
        assert_eq!(value["stats"]["unchanged"], 1);
        assert_eq!(value["config"]["backup_interval_cycles"], 1);

        assert_eq!(ConsoleCommand::Quit.execute(&mut scheduler).unwrap(), Flow::Quit);
    }

    #[test]
    fn test_execute_reports_failure_without_error() {
        let tmp_dir = TempDir::new().unwrap();
        let writer = BackupWriter::new(tmp_dir.path().join("backups"));
        let mut scheduler =
            AutosaveScheduler::new(Configuration::default(), tmp_dir.path().join("missing.xml"), writer, || {});

        let flow = ConsoleCommand::BackupNow.execute(&mut scheduler).unwrap();
        assert!(matches!(flow, Flow::Continue(ref reply) if reply.starts_with("Backup failed")));
        assert_eq!(scheduler.stats().failed, 1);
    }
}
