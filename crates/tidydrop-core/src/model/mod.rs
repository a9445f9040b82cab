/// Data model shared by the classifier, relocator, detector and stats sink.
pub mod category;
pub mod event;
pub mod outcome;
pub mod size;

pub use category::{Category, OTHER_LABEL};
pub use event::{file_name_of, FileEvent};
pub use outcome::{
    ClassificationResult, Disposition, FailureKind, RelocationOutcome, SensitiveMatch, SkipReason,
};
pub use size::{format_count, format_size};
