/// Counters collected while scanning, logged and printed once at the end.
use crate::model::{format_count, ByteSize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub roots: u64,
    pub files: u64,
    pub folders: u64,
    /// Sum of all file sizes.
    pub bytes: u64,
    /// Symbolic links met during the walk; never followed or recorded.
    pub skipped_links: u64,
    /// Entries dropped under [`ErrorPolicy::Skip`](super::ErrorPolicy::Skip).
    pub skipped_errors: u64,
    pub duration: Duration,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} folders, {} in {} root(s) ({:.2?})",
            format_count(self.files),
            format_count(self.folders),
            ByteSize(self.bytes),
            self.roots,
            self.duration
        )?;
        if self.skipped_links > 0 {
            write!(f, "; skipped {} symlinks", format_count(self.skipped_links))?;
        }
        if self.skipped_errors > 0 {
            write!(f, "; skipped {} unreadable entries", format_count(self.skipped_errors))?;
        }
        Ok(())
    }
}
