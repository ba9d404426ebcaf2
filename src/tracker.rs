/// Remembers the last working-file content that made it into a backup.
/// Content is kept as raw bytes; the working file need not be UTF-8.
#[derive(Debug, Default, Clone)]
pub struct ChangeTracker {
    baseline: Option<Vec<u8>>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact full-content comparison. With no baseline yet, everything counts as changed.
    pub fn has_changed(&self, content: &[u8]) -> bool {
        self.baseline.as_deref() != Some(content)
    }

    /// Commit `content` as the new baseline. Call only after a successful backup.
    pub fn accept(&mut self, content: Vec<u8>) {
        self.baseline = Some(content);
    }

    pub fn baseline(&self) -> Option<&[u8]> {
        self.baseline.as_deref()
    }
}
