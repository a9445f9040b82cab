/// Snapshot-diffing detector for platforms (or filesystems) without usable
/// notifications.
use super::{ChangeDetector, DetectorMode, DetectorTiming, SettleQueue, StopToken, WAIT_SLICE};
use crate::error::{Error, Result};
use crate::model::FileEvent;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct PollingDetector {
    dir: PathBuf,
    /// Names present at the last snapshot. Names that leave the directory are
    /// forgotten, so a later file with the same name is new again.
    known: HashSet<OsString>,
    settle: SettleQueue,
    interval: Duration,
    next_scan: Instant,
}

impl PollingDetector {
    /// Take the first snapshot of `dir`. Files already present are never
    /// emitted; the startup scan handles them.
    pub fn new(dir: &Path, timing: DetectorTiming) -> Result<Self> {
        let known = snapshot(dir).map_err(|e| Error::WatchSetup {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Polling {} ({} files known)", dir.display(), known.len());
        Ok(Self {
            dir: dir.to_path_buf(),
            known,
            settle: SettleQueue::new(timing.poll_settle),
            interval: timing.poll_interval,
            next_scan: Instant::now() + timing.poll_interval,
        })
    }

    /// Diff a fresh snapshot against the known set and queue the newcomers.
    fn rescan(&mut self, now: Instant) {
        let current = match snapshot(&self.dir) {
            Ok(current) => current,
            Err(err) => {
                warn!("Could not list {}: {err}", self.dir.display());
                return;
            }
        };
        for name in current.difference(&self.known) {
            let path = self.dir.join(name);
            debug!("New file {}", path.display());
            self.settle.push(path, now);
        }
        self.known = current;
    }
}

impl ChangeDetector for PollingDetector {
    fn mode(&self) -> DetectorMode {
        DetectorMode::Polling
    }

    fn poll(&mut self, stop: &StopToken) -> Vec<FileEvent> {
        let now = Instant::now();
        if now >= self.next_scan {
            self.rescan(now);
            self.next_scan = now + self.interval;
        }

        let ready = self.settle.pop_due(now);
        if !ready.is_empty() {
            return ready;
        }

        let mut wait = self.next_scan.saturating_duration_since(now);
        if let Some(due) = self.settle.next_due() {
            wait = wait.min(due.saturating_duration_since(now));
        }
        stop.sleep(wait.min(WAIT_SLICE));
        Vec::new()
    }
}

/// Names of the regular files directly inside `dir`.
fn snapshot(dir: &Path) -> io::Result<HashSet<OsString>> {
    let mut names = HashSet::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type().is_ok_and(|t| t.is_file()) {
            names.insert(entry.file_name());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quick_timing() -> DetectorTiming {
        DetectorTiming {
            poll_interval: Duration::from_millis(30),
            poll_settle: Duration::from_millis(30),
            ..DetectorTiming::default()
        }
    }

    fn poll_for(detector: &mut PollingDetector, duration: Duration) -> Vec<FileEvent> {
        let stop = StopToken::new();
        let deadline = Instant::now() + duration;
        let mut out = Vec::new();
        while Instant::now() < deadline {
            out.extend(detector.poll(&stop));
        }
        out
    }

    #[test]
    fn snapshot_lists_only_regular_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(tmp.path().join("Images")).unwrap();
        let names = snapshot(tmp.path()).unwrap();
        assert_eq!(names.len(), 1);
        assert!(names.contains(&OsString::from("a.txt")));
    }

    #[test]
    fn files_present_at_start_are_not_emitted() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("old.pdf"), b"x").unwrap();
        let mut detector = PollingDetector::new(tmp.path(), quick_timing()).unwrap();
        assert!(poll_for(&mut detector, Duration::from_millis(200)).is_empty());
    }

    #[test]
    fn new_file_is_emitted_exactly_once() {
        let tmp = TempDir::new().unwrap();
        let mut detector = PollingDetector::new(tmp.path(), quick_timing()).unwrap();
        let path = tmp.path().join("new.zip");
        fs::write(&path, b"PK").unwrap();

        let events = poll_for(&mut detector, Duration::from_millis(400));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path, path);
    }

    /// A name that left and came back is a fresh download.
    #[test]
    fn reappearing_name_is_new_again() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("again.pdf");
        fs::write(&path, b"1").unwrap();
        let mut detector = PollingDetector::new(tmp.path(), quick_timing()).unwrap();

        fs::remove_file(&path).unwrap();
        assert!(poll_for(&mut detector, Duration::from_millis(150)).is_empty());

        fs::write(&path, b"2").unwrap();
        let events = poll_for(&mut detector, Duration::from_millis(400));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn stop_token_ends_wait_promptly() {
        let tmp = TempDir::new().unwrap();
        let timing = DetectorTiming {
            poll_interval: Duration::from_secs(60),
            ..DetectorTiming::default()
        };
        let mut detector = PollingDetector::new(tmp.path(), timing).unwrap();
        let stop = StopToken::new();
        stop.stop();
        let start = Instant::now();
        assert!(detector.poll(&stop).is_empty());
        assert!(start.elapsed() < WAIT_SLICE);
    }
}
