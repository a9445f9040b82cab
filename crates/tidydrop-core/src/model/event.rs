/// A file that is ready to be classified.
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Produced by the change detector (or the startup scan) once a regular file
/// has appeared and settled. Consumed exactly once by the organizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Absolute path of the file inside the watched directory.
    pub path: PathBuf,
    /// Wall-clock time at which the file was first noticed.
    pub discovered_at: DateTime<Local>,
}

impl FileEvent {
    pub fn new(path: PathBuf, discovered_at: DateTime<Local>) -> Self {
        Self {
            path,
            discovered_at,
        }
    }

    /// Event for a file noticed right now.
    pub fn now(path: PathBuf) -> Self {
        Self::new(path, Local::now())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name only, lossily converted for display.
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

/// Display name of a path — the final component, or the whole path when it
/// has none.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
