//! Save triggers used by the binary.
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::AutobakError;
use crate::scheduler::SaveTrigger;

/// Runs an external command that makes the host write its working file.
/// The command is waited on so the file is complete before a backup reads it.
#[derive(Debug, Clone)]
pub struct ShellTrigger {
    program: String,
    args: Vec<String>,
}

impl ShellTrigger {
    pub fn parse(command_line: &str) -> crate::Result<Self> {
        let mut words = shellwords::split(command_line)
            .map_err(|e| AutobakError::Trigger(format!("cannot parse {:?}: {:?}", command_line, e)))?;
        if words.is_empty() {
            return Err(AutobakError::Trigger("empty save command".to_string()));
        }
        let program = words.remove(0);
        Ok(Self { program, args: words })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn run(&self) -> crate::Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| AutobakError::Trigger(format!("failed to spawn {}: {}", self.program, e)))?;
        if !status.success() {
            return Err(AutobakError::Trigger(format!("{} exited with {}", self.program, status)));
        }
        Ok(())
    }
}

impl SaveTrigger for ShellTrigger {
    fn trigger_save(&mut self) {
        if let Err(e) = self.run() {
            warn!("Save trigger failed: {}", e);
        }
    }
}

/// For hosts that write the working file on their own schedule.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrigger;

impl SaveTrigger for NoopTrigger {
    fn trigger_save(&mut self) {
        debug!("No save command configured; assuming the working file is current");
    }
}
