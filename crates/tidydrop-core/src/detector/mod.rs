/// Change detection — turns "something appeared in the watched directory"
/// into a deduplicated stream of settled [`FileEvent`]s.
///
/// Two strategies implement [`ChangeDetector`]:
///
/// - [`events::EventDetector`] subscribes to OS notifications through
///   `notify` (non-recursive), debounces them per path and settles them.
/// - [`polling::PollingDetector`] diffs directory snapshots on a fixed
///   interval.
///
/// Both are primed on construction (subscribed, or first snapshot taken), so
/// a detector opened before the startup scan misses nothing that appears
/// during it.
///
/// # Cancellation
///
/// Every wait inside [`ChangeDetector::poll`] is bounded by [`WAIT_SLICE`], so
/// a stopped [`StopToken`] is noticed within ~200 ms.
pub mod cooldown;
pub mod events;
pub mod polling;
pub mod settle;

pub use cooldown::CooldownRegistry;
pub use events::EventDetector;
pub use polling::PollingDetector;
pub use settle::SettleQueue;

use crate::error::{Error, Result};
use crate::model::FileEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Longest uninterrupted wait anywhere in the watch loop.
pub const WAIT_SLICE: Duration = Duration::from_millis(200);

/// Shared cancellation flag, checked at every wait boundary.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Non-blocking.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Sleep for `duration` in slices of at most [`WAIT_SLICE`].
    ///
    /// Returns `false` if the stop flag was raised before the time was up.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(WAIT_SLICE));
        }
    }
}

/// Which detection strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorMode {
    /// Notifications if the platform allows it, polling otherwise.
    #[default]
    Auto,
    Events,
    Polling,
}

impl fmt::Display for DetectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Events => "events",
            Self::Polling => "polling",
        })
    }
}

impl FromStr for DetectorMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "events" | "event" => Ok(Self::Events),
            "polling" | "poll" => Ok(Self::Polling),
            other => Err(format!("unknown watch mode '{other}'")),
        }
    }
}

/// Delays used by the detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorTiming {
    /// Event mode: repeated notifications for one path inside this window
    /// are dropped.
    pub debounce: Duration,
    /// Event mode: wait between notification and emission.
    pub event_settle: Duration,
    /// Polling mode: time between snapshots.
    pub poll_interval: Duration,
    /// Polling mode: wait between first sighting and emission.
    pub poll_settle: Duration,
}

impl Default for DetectorTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(2),
            event_settle: Duration::from_secs(1),
            poll_interval: Duration::from_secs(3),
            poll_settle: Duration::from_secs(2),
        }
    }
}

/// A source of settled file events. The organizer cannot tell the
/// implementations apart.
pub trait ChangeDetector: Send {
    /// The concrete strategy in use (never [`DetectorMode::Auto`]).
    fn mode(&self) -> DetectorMode;

    /// Wait at most one [`WAIT_SLICE`] and return the events that are ready.
    ///
    /// Per-cycle problems (a failed snapshot, a notification error) are
    /// logged and yield an empty batch; they never end the watch.
    fn poll(&mut self, stop: &StopToken) -> Vec<FileEvent>;
}

/// Open and prime a detector for `dir`.
///
/// Fails only if the directory cannot be read at all, or if
/// [`DetectorMode::Events`] was requested explicitly and the notification
/// backend refuses the directory.
pub fn open_detector(
    mode: DetectorMode,
    dir: &Path,
    timing: DetectorTiming,
) -> Result<Box<dyn ChangeDetector>> {
    ensure_readable(dir)?;

    let detector: Box<dyn ChangeDetector> = match mode {
        DetectorMode::Events => Box::new(EventDetector::watch(dir, timing)?),
        DetectorMode::Polling => Box::new(PollingDetector::new(dir, timing)?),
        DetectorMode::Auto => match EventDetector::watch(dir, timing) {
            Ok(detector) => Box::new(detector),
            Err(err) => {
                warn!("Filesystem notifications unavailable, falling back to polling: {err}");
                Box::new(PollingDetector::new(dir, timing)?)
            }
        },
    };

    info!("Watching {} ({} mode)", dir.display(), detector.mode());
    Ok(detector)
}

/// The only fatal condition: the watched directory cannot be listed.
pub fn ensure_readable(dir: &Path) -> Result<()> {
    fs::read_dir(dir).map(drop).map_err(|e| Error::WatchSetup {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stopped_token_cuts_sleep_short() {
        let stop = StopToken::new();
        stop.stop();
        let start = Instant::now();
        assert!(!stop.sleep(Duration::from_secs(5)));
        assert!(start.elapsed() < WAIT_SLICE);
    }

    #[test]
    fn token_clones_share_the_flag() {
        let stop = StopToken::new();
        let other = stop.clone();
        other.stop();
        assert!(stop.is_stopped());
    }

    #[test]
    fn unstopped_sleep_runs_to_completion() {
        let stop = StopToken::new();
        assert!(stop.sleep(Duration::from_millis(20)));
    }

    #[test]
    fn mode_parses_and_serialises_lowercase() {
        assert_eq!("Polling".parse::<DetectorMode>().unwrap(), DetectorMode::Polling);
        assert!("sometimes".parse::<DetectorMode>().is_err());
        assert_eq!(serde_json::to_string(&DetectorMode::Events).unwrap(), "\"events\"");
    }

    #[test]
    fn missing_directory_is_a_setup_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = open_detector(DetectorMode::Polling, &missing, DetectorTiming::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::WatchSetup { .. }));
    }

    #[test]
    fn polling_mode_is_honoured() {
        let tmp = TempDir::new().unwrap();
        let detector =
            open_detector(DetectorMode::Polling, tmp.path(), DetectorTiming::default()).unwrap();
        assert_eq!(detector.mode(), DetectorMode::Polling);
    }
}
