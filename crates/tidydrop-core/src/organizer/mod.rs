/// Organizer — wires change detection → classification → relocation → stats.
///
/// Files are handled strictly one at a time on the organizer thread; there
/// are no parallel moves.
///
/// # Usage
///
/// ```ignore
/// let handle = start_organizer(organizer, DetectorMode::Auto, DetectorTiming::default());
/// // receive OrganizerMessage values on handle.receiver
/// handle.stop();
/// handle.join();
/// ```
///
/// # Cancellation
///
/// [`OrganizerHandle::stop`] raises the shared [`StopToken`]; the thread
/// notices it at the next wait boundary (within ~200 ms, or after the file
/// currently being moved). Events that were still settling are dropped and
/// picked up by the next startup scan.
pub mod progress;

pub use progress::OrganizerMessage;

use crate::classifier::Classifier;
use crate::config::OrganizerConfig;
use crate::detector::{open_detector, ChangeDetector, DetectorMode, DetectorTiming, StopToken};
use crate::error::{Error, Result};
use crate::model::{file_name_of, Category, FileEvent, RelocationOutcome, SkipReason};
use crate::platform::{Notifier, NullNotifier, QueuedNotifier};
use crate::relocator::Relocator;
use crate::stats::StatsSink;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcomes buffered for the frontend. When it falls behind, further
/// outcomes are dropped rather than slowing the watch loop.
pub const OUTCOME_CHANNEL_CAPACITY: usize = 1_024;

/// How long a control message may wait for room in a full channel.
const CONTROL_SEND_TIMEOUT: Duration = Duration::from_secs(1);

pub struct Organizer {
    classifier: Classifier,
    relocator: Relocator,
    stats: Arc<StatsSink>,
    notifier: Box<dyn Notifier>,
}

impl Organizer {
    /// Organizer for `root` with notifications off.
    pub fn new(root: impl Into<PathBuf>, classifier: Classifier, stats: Arc<StatsSink>) -> Self {
        Self {
            classifier,
            relocator: Relocator::new(root),
            stats,
            notifier: Box::new(NullNotifier),
        }
    }

    /// Organizer set up from a loaded config. `notifier` is only used when
    /// `show_notifications` is on.
    pub fn from_config(
        root: impl Into<PathBuf>,
        config: &OrganizerConfig,
        stats: Arc<StatsSink>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let organizer = Self::new(root, Classifier::new(&config.rules), stats);
        if config.show_notifications {
            organizer.with_notifier(notifier)
        } else {
            organizer
        }
    }

    /// Deliver move notifications through `notifier`, queued on their own
    /// thread so a slow helper never stalls processing.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Box::new(QueuedNotifier::new(notifier));
        self
    }

    /// The watched directory.
    pub fn root(&self) -> &Path {
        self.relocator.root()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn stats(&self) -> &Arc<StatsSink> {
        &self.stats
    }

    /// Classify and, if allowed, relocate one file.
    ///
    /// Never fails: every problem becomes a skipped outcome with a reason.
    pub fn process(&self, event: &FileEvent) -> RelocationOutcome {
        let path = event.path();
        let name = event.file_name();
        let skip = |reason: SkipReason| {
            RelocationOutcome::skipped(name.clone(), path.to_path_buf(), Category::Other, reason)
        };

        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return skip(SkipReason::NotRegularFile),
            Err(err) => {
                let err = Error::from_io(path, err);
                if !err.is_not_found() {
                    warn!("Cannot inspect {}: {err}", path.display());
                }
                return skip(SkipReason::from_error(&err));
            }
        }

        let verdict = self.classifier.classify(path);
        if let Some(reason) = verdict.sensitive {
            warn!("Leaving sensitive file in place: {name} ({reason})");
            return skip(SkipReason::Sensitive(reason));
        }

        // "Other" never reaches the relocator.
        let Some(label) = verdict.category.label() else {
            debug!("No category for {name}, leaving it in place");
            return skip(SkipReason::Unmapped);
        };

        let outcome = self.relocator.relocate(path, label);
        if let Some(destination) = outcome.destination() {
            info!("Organized {name} -> {label}/{}", file_name_of(destination));
            self.stats.record(&outcome);
            self.notifier.notify(&format!("File organized: {name}"), label);
        }
        outcome
    }

    /// Process every regular file currently in the watched directory, in
    /// name order.
    ///
    /// Fails only if the directory cannot be listed.
    pub fn scan_once(&self) -> Result<Vec<RelocationOutcome>> {
        let root = self.root();
        let setup_failed = |e: std::io::Error| Error::WatchSetup {
            path: root.to_path_buf(),
            reason: e.to_string(),
        };

        let mut files: Vec<PathBuf> = fs::read_dir(root)
            .map_err(setup_failed)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .map(|entry| entry.path())
            .collect();
        files.sort();

        let outcomes: Vec<RelocationOutcome> = files
            .into_iter()
            .map(|path| self.process(&FileEvent::now(path)))
            .collect();

        let moved = outcomes.iter().filter(|o| o.is_moved()).count();
        info!(
            "Scan of {} finished: {moved} organized, {} left in place",
            root.display(),
            outcomes.len() - moved
        );
        Ok(outcomes)
    }

    /// Feed detector events through [`process`](Self::process) until
    /// `stop` is raised.
    pub fn watch(
        &self,
        detector: &mut dyn ChangeDetector,
        stop: &StopToken,
        mut on_outcome: impl FnMut(RelocationOutcome),
    ) {
        while !stop.is_stopped() {
            for event in detector.poll(stop) {
                if stop.is_stopped() {
                    break;
                }
                on_outcome(self.process(&event));
            }
        }
    }
}

/// Handle to a running organizer thread.
pub struct OrganizerHandle {
    /// Receive [`OrganizerMessage`] values from the organizer thread.
    pub receiver: Receiver<OrganizerMessage>,
    stop: StopToken,
    thread: Option<thread::JoinHandle<()>>,
}

impl OrganizerHandle {
    /// Signal the organizer thread to stop. Non-blocking.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// A clone of the stop token, e.g. for a signal or input handler.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// `true` once the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Stop the thread and wait for it to exit.
    pub fn join(mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Organizer thread panicked");
            }
        }
    }
}

/// Start the organizer on a background thread: prime the detector, run the
/// startup scan, then watch until stopped.
pub fn start_organizer(
    organizer: Organizer,
    mode: DetectorMode,
    timing: DetectorTiming,
) -> OrganizerHandle {
    let (tx, rx) = bounded::<OrganizerMessage>(OUTCOME_CHANNEL_CAPACITY);
    let stop = StopToken::new();
    let stop_clone = stop.clone();

    let thread = thread::Builder::new()
        .name("tidydrop-organizer".into())
        .spawn(move || run_organizer(organizer, mode, timing, stop_clone, tx))
        .expect("failed to spawn organizer thread");

    OrganizerHandle {
        receiver: rx,
        stop,
        thread: Some(thread),
    }
}

// ─── Background thread ──────────────────────────────────────────────────────

fn run_organizer(
    organizer: Organizer,
    mode: DetectorMode,
    timing: DetectorTiming,
    stop: StopToken,
    tx: Sender<OrganizerMessage>,
) {
    // Prime before the scan so nothing arriving during it is missed.
    let mut detector = match open_detector(mode, organizer.root(), timing) {
        Ok(detector) => detector,
        Err(err) => {
            warn!("Organizer: {err}");
            send_control(&tx, OrganizerMessage::Failed(err.to_string()));
            return;
        }
    };
    send_control(
        &tx,
        OrganizerMessage::Watching {
            dir: organizer.root().to_path_buf(),
            mode: detector.mode(),
        },
    );

    let start = Instant::now();
    match organizer.scan_once() {
        Ok(outcomes) => {
            let moved = outcomes.iter().filter(|o| o.is_moved()).count();
            let skipped = outcomes.len() - moved;
            for outcome in outcomes {
                publish(&tx, outcome);
            }
            send_control(
                &tx,
                OrganizerMessage::ScanComplete {
                    moved,
                    skipped,
                    duration: start.elapsed(),
                },
            );
        }
        Err(err) => {
            warn!("Organizer: startup scan failed: {err}");
            send_control(&tx, OrganizerMessage::Failed(err.to_string()));
            return;
        }
    }

    organizer.watch(detector.as_mut(), &stop, |outcome| publish(&tx, outcome));

    debug!("Organizer: stopped for {}", organizer.root().display());
    send_control(&tx, OrganizerMessage::Stopped);
}

fn publish(tx: &Sender<OrganizerMessage>, outcome: RelocationOutcome) {
    if tx.try_send(OrganizerMessage::Outcome(outcome)).is_err() {
        debug!("Outcome channel full or closed, dropping outcome");
    }
}

fn send_control(tx: &Sender<OrganizerMessage>, message: OrganizerMessage) {
    let _ = tx.send_timeout(message, CONTROL_SEND_TIMEOUT);
}
