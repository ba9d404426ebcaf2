use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "autobak";
pub const WORKING_FILE: &str = "designs/__editor__.xml";
pub const ARCHIVE_DIR: &str = "backups";
pub const CONFIG_FILE: &str = "INTERVAL.TXT";

/// Where the working file, the archives and the settings file live.
#[derive(Debug, Clone)]
pub struct DataLayout {
    pub data_dir: PathBuf,
    pub working_file: PathBuf,
    pub archive_dir: PathBuf,
    pub config_file: PathBuf,
}

impl DataLayout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let archive_dir = data_dir.join(ARCHIVE_DIR);
        Self {
            working_file: data_dir.join(WORKING_FILE),
            config_file: archive_dir.join(CONFIG_FILE),
            archive_dir,
            data_dir,
        }
    }

    /// Layout under the per-user data directory.
    pub fn user_default() -> Self {
        Self::new(default_data_dir())
    }

    pub fn with_working_file(mut self, path: &Path) -> Self {
        self.working_file = path.to_path_buf();
        self
    }
}

pub fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(APP_DIR)
    } else if cfg!(target_os = "macos") {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("Library/Application Support")
            .join(APP_DIR)
    } else {
        // Linux and others
        std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(APP_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = DataLayout::new("/data");
        assert_eq!(layout.working_file, PathBuf::from("/data/designs/__editor__.xml"));
        assert_eq!(layout.archive_dir, PathBuf::from("/data/backups"));
        assert_eq!(layout.config_file, PathBuf::from("/data/backups/INTERVAL.TXT"));

        let layout = layout.with_working_file(Path::new("/elsewhere/doc.xml"));
        assert_eq!(layout.working_file, PathBuf::from("/elsewhere/doc.xml"));
        assert_eq!(layout.archive_dir, PathBuf::from("/data/backups"));
    }

    #[test]
    fn test_default_data_dir_ends_with_app_dir() {
        assert!(default_data_dir().ends_with(APP_DIR));
    }
}
