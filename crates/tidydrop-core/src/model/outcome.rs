/// Classifier verdicts and per-file relocation outcomes.
///
/// Every skip carries a distinguishable reason so an operator can audit why a
/// file was left untouched.
use crate::error::Error;
use crate::model::Category;
use std::fmt;
use std::path::PathBuf;

/// Which sensitive-data rule matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensitiveMatch {
    /// The extension is on the forbidden-extension list.
    ForbiddenExtension(String),
    /// The file name contains a forbidden keyword.
    NameKeyword(String),
    /// A content keyword appeared in the first lines of the file.
    ContentKeyword(String),
    /// The content peek failed, so the file is treated as sensitive.
    Unreadable(String),
    /// The scanned lines run past the peek limit and were not fully read.
    ExcerptTooLong { limit: u64 },
}

impl fmt::Display for SensitiveMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForbiddenExtension(ext) => write!(f, "forbidden extension {ext}"),
            Self::NameKeyword(kw) => write!(f, "name contains \"{kw}\""),
            Self::ContentKeyword(kw) => write!(f, "content mentions \"{kw}\""),
            Self::Unreadable(msg) => write!(f, "content unreadable ({msg})"),
            Self::ExcerptTooLong { limit } => {
                write!(f, "leading lines exceed the {limit}-byte peek limit")
            }
        }
    }
}

/// Output of the classifier. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// Destination category. Always [`Category::Other`] for sensitive files,
    /// since the category lookup is skipped for them.
    pub category: Category,
    /// `Some` when any sensitive-data rule matched.
    pub sensitive: Option<SensitiveMatch>,
}

impl ClassificationResult {
    pub fn sensitive(reason: SensitiveMatch) -> Self {
        Self {
            category: Category::Other,
            sensitive: Some(reason),
        }
    }

    pub fn clear(category: Category) -> Self {
        Self {
            category,
            sensitive: None,
        }
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive.is_some()
    }
}

/// Why a relocation attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    PermissionDenied,
    CrossVolumeMoveFailed,
    CollisionExhausted,
    Io,
}

/// Why a file was left where it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Sensitive(SensitiveMatch),
    /// Extension has no category ("Other").
    Unmapped,
    /// The file disappeared before it could be moved.
    Vanished,
    /// Directories, symlinks and other non-regular entries are ignored.
    NotRegularFile,
    Failed { kind: FailureKind, message: String },
}

impl SkipReason {
    /// Short machine-friendly tag, used in summaries.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Sensitive(_) => "sensitive",
            Self::Unmapped => "unmapped",
            Self::Vanished => "vanished",
            Self::NotRegularFile => "not-a-file",
            Self::Failed { .. } => "failed",
        }
    }

    /// Fold a relocation error into a skip reason.
    pub fn from_error(err: &Error) -> Self {
        let kind = match err {
            Error::NotFound(_) => return Self::Vanished,
            Error::NotRegularFile(_) => return Self::NotRegularFile,
            Error::PermissionDenied { .. } => FailureKind::PermissionDenied,
            Error::CrossVolumeMoveFailed { .. } => FailureKind::CrossVolumeMoveFailed,
            Error::DestinationCollisionExhausted { .. } => FailureKind::CollisionExhausted,
            _ => FailureKind::Io,
        };
        Self::Failed {
            kind,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensitive(why) => write!(f, "sensitive: {why}"),
            Self::Unmapped => f.write_str("unmapped extension (Other)"),
            Self::Vanished => f.write_str("file vanished before processing"),
            Self::NotRegularFile => f.write_str("not a regular file"),
            Self::Failed { message, .. } => write!(f, "failed: {message}"),
        }
    }
}

/// What happened to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Moved { destination: PathBuf },
    Skipped(SkipReason),
}

/// Result of one classify → relocate attempt. Folded into the stats sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationOutcome {
    /// File name as it was in the watched directory.
    pub original_name: String,
    pub source: PathBuf,
    pub category: Category,
    pub disposition: Disposition,
}

impl RelocationOutcome {
    pub fn moved(
        original_name: String,
        source: PathBuf,
        category: Category,
        destination: PathBuf,
    ) -> Self {
        Self {
            original_name,
            source,
            category,
            disposition: Disposition::Moved { destination },
        }
    }

    pub fn skipped(
        original_name: String,
        source: PathBuf,
        category: Category,
        reason: SkipReason,
    ) -> Self {
        Self {
            original_name,
            source,
            category,
            disposition: Disposition::Skipped(reason),
        }
    }

    pub fn is_moved(&self) -> bool {
        matches!(self.disposition, Disposition::Moved { .. })
    }

    /// Final destination path, if the file was moved.
    pub fn destination(&self) -> Option<&PathBuf> {
        match &self.disposition {
            Disposition::Moved { destination } => Some(destination),
            Disposition::Skipped(_) => None,
        }
    }

    /// Reason the file was not moved, if it was not.
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.disposition {
            Disposition::Moved { .. } => None,
            Disposition::Skipped(reason) => Some(reason),
        }
    }
}
