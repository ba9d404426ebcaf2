pub mod config;
pub mod console;
pub mod driver;
pub mod error;
pub mod layout;
pub mod scheduler;
pub mod tracker;
pub mod trigger;
pub mod writer;

pub use config::{ConfigStore, Configuration};
pub use error::AutobakError;
pub use scheduler::{AutosaveScheduler, BackupOutcome, Clock, SaveTrigger, SchedulerState, SchedulerStats};
pub use tracker::ChangeTracker;
pub use writer::BackupWriter;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, AutobakError>;
