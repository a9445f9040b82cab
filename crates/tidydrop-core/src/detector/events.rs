/// Notification-driven detector built on `notify`.
///
/// The watcher callback runs on `notify`'s own thread and only forwards raw
/// events into a bounded channel; debouncing and settling happen on the
/// caller's thread inside [`ChangeDetector::poll`].
use super::{
    ChangeDetector, CooldownRegistry, DetectorMode, DetectorTiming, SettleQueue, StopToken,
    WAIT_SLICE,
};
use crate::error::{Error, Result};
use crate::model::FileEvent;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Raw notifications buffered between the `notify` thread and the watch
/// loop. Overflow is harmless: the burst was for paths already queued, and
/// anything truly lost is picked up by the next startup scan.
pub const EVENT_CHANNEL_CAPACITY: usize = 4_096;

pub struct EventDetector {
    dir: PathBuf,
    // Dropping the watcher ends the subscription.
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    cooldown: CooldownRegistry,
    settle: SettleQueue,
}

impl EventDetector {
    /// Subscribe to creations in `dir` (non-recursive).
    ///
    /// The directory is canonicalised first so reported paths can be matched
    /// against it on backends that resolve symlinks (FSEvents does).
    pub fn watch(dir: &Path, timing: DetectorTiming) -> Result<Self> {
        let dir = dir.canonicalize().map_err(|e| Error::WatchSetup {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        let dir = dir.as_path();
        let setup_failed = |err: notify::Error| Error::WatchSetup {
            path: dir.to_path_buf(),
            reason: err.to_string(),
        };

        let (tx, rx) = bounded::<notify::Result<Event>>(EVENT_CHANNEL_CAPACITY);
        let mut watcher = notify::recommended_watcher(move |event| {
            let _ = tx.try_send(event);
        })
        .map_err(setup_failed)?;
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(setup_failed)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            _watcher: watcher,
            rx,
            cooldown: CooldownRegistry::new(timing.debounce),
            settle: SettleQueue::new(timing.event_settle),
        })
    }

    fn handle(&mut self, event: notify::Result<Event>, now: Instant) {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                warn!("Watcher error on {}: {err}", self.dir.display());
                return;
            }
        };
        let Some(path) = created_path(&event) else {
            return;
        };
        // Non-recursive, but some backends still report the directory itself.
        if path.parent() != Some(self.dir.as_path()) {
            return;
        }
        if !self.cooldown.admit(path, now) {
            debug!("Debounced {}", path.display());
            return;
        }
        if self.settle.push(path.to_path_buf(), now) {
            debug!("Settling {}", path.display());
        }
    }
}

impl ChangeDetector for EventDetector {
    fn mode(&self) -> DetectorMode {
        DetectorMode::Events
    }

    fn poll(&mut self, stop: &StopToken) -> Vec<FileEvent> {
        let now = Instant::now();
        let wait = self
            .settle
            .next_due()
            .map_or(WAIT_SLICE, |due| due.saturating_duration_since(now))
            .min(WAIT_SLICE);

        if !wait.is_zero() && !stop.is_stopped() {
            match self.rx.recv_timeout(wait) {
                Ok(event) => self.handle(event, Instant::now()),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    stop.sleep(wait);
                }
            }
        }
        while let Ok(event) = self.rx.try_recv() {
            self.handle(event, Instant::now());
        }

        let now = Instant::now();
        self.cooldown.prune(now);
        self.settle.pop_due(now)
    }
}

/// The path a notification says was created, if it is a creation.
///
/// A rename *into* the directory (e.g. `movie.mkv.part` → `movie.mkv`)
/// counts as a creation of the new name.
fn created_path(event: &Event) -> Option<&Path> {
    match event.kind {
        EventKind::Create(_) => event.paths.first(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.first(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event.paths.last(),
        // Backends that cannot tell rename halves apart; the settle check
        // drops the half that no longer exists.
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => event.paths.first(),
        _ => None,
    }
    .map(PathBuf::as_path)
}
