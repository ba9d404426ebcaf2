use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutobakError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Configuration write error: {0}")]
    ConfigIo(String),

    #[error("Cannot read working file {}: {source}", .path.display())]
    WorkingFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write archive {}: {source}", .path.display())]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Save trigger error: {0}")]
    Trigger(String),

    #[error("Console error: {0}")]
    Console(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AutobakError {
    /// True for the failures the scheduler treats as "try again next cycle".
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AutobakError::WorkingFileRead { .. } | AutobakError::ArchiveWrite { .. } | AutobakError::Io(_)
        )
    }
}
