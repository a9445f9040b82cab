/// Read-only summaries of the organized folders.
pub mod folders;

pub use folders::{folder_report, FolderSummary};
