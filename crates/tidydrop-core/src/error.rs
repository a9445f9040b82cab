/// Error taxonomy for the organizer engine.
///
/// Per-file errors (everything except [`Error::WatchSetup`]) are caught by the
/// organizer, logged, and folded into a non-moved outcome. They never stop the
/// watch loop.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of `_N` suffixes tried before a destination name is
/// considered exhausted.
pub const MAX_COLLISION_PROBES: u32 = 10_000;

#[derive(Error, Debug)]
pub enum Error {
    /// The file disappeared between discovery and processing.
    #[error("file vanished before it could be processed: {}", .0.display())]
    NotFound(PathBuf),

    /// Directories, symlinks and device nodes are never moved.
    #[error("not a regular file: {}", .0.display())]
    NotRegularFile(PathBuf),

    #[error("permission denied for {}: {}", .path.display(), .source)]
    PermissionDenied { path: PathBuf, source: io::Error },

    /// Copy-then-delete across volumes failed. Any partial destination data
    /// has already been removed when this is returned.
    #[error("cross-volume move of {} to {} failed: {}", .from.display(), .to.display(), .reason)]
    CrossVolumeMoveFailed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("could not read {} for content inspection: {}", .path.display(), .source)]
    ContentScanUnreadable { path: PathBuf, source: io::Error },

    #[error("no free destination name for {} in {} after {} probes", .name, .dir.display(), .probes)]
    DestinationCollisionExhausted {
        dir: PathBuf,
        name: String,
        probes: u32,
    },

    /// The watched directory cannot be opened or subscribed to at all.
    #[error("cannot watch {}: {}", .path.display(), .reason)]
    WatchSetup { path: PathBuf, reason: String },

    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io { path: PathBuf, source: io::Error },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Map an `io::Error` on `path` onto the taxonomy.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
            _ => Self::Io { path, source },
        }
    }

    /// `true` for the benign "file is already gone" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_io_maps_not_found() {
        let err = Error::from_io("/tmp/x", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());
    }

    #[test]
    fn from_io_maps_permission_denied() {
        let err = Error::from_io("/tmp/x", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[test]
    fn from_io_keeps_other_kinds_as_io() {
        let err = Error::from_io("/tmp/x", io::Error::other("disk on fire"));
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("disk on fire"));
    }
}
