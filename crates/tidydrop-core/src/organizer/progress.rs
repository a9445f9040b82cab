/// Messages sent from the organizer thread to the frontend via a crossbeam
/// channel.
use crate::detector::DetectorMode;
use crate::model::RelocationOutcome;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum OrganizerMessage {
    /// The detector is primed; `mode` is the strategy actually in use.
    Watching { dir: PathBuf, mode: DetectorMode },
    /// The startup scan has finished.
    ScanComplete {
        moved: usize,
        skipped: usize,
        duration: Duration,
    },
    /// One file was handled (moved or skipped).
    Outcome(RelocationOutcome),
    /// The watched directory could not be opened. The thread has exited.
    Failed(String),
    /// The thread exited after a stop request.
    Stopped,
}
