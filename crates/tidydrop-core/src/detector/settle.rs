/// Settle queue — holds newly noticed paths until they stop changing.
///
/// Every path waits the same fixed delay, so the queue is ordered by due time
/// and only the front ever needs checking.
use crate::model::FileEvent;
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Pending {
    path: PathBuf,
    discovered_at: DateTime<Local>,
    due: Instant,
}

#[derive(Debug, Clone)]
pub struct SettleQueue {
    delay: Duration,
    pending: VecDeque<Pending>,
}

impl SettleQueue {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: VecDeque::new(),
        }
    }

    /// Queue `path`, noticed at `now`. Returns `false` if it is already
    /// waiting.
    pub fn push(&mut self, path: PathBuf, now: Instant) -> bool {
        if self.pending.iter().any(|p| p.path == path) {
            return false;
        }
        self.pending.push_back(Pending {
            path,
            discovered_at: Local::now(),
            due: now + self.delay,
        });
        true
    }

    /// Remove every entry due at `now` and turn those that are still regular
    /// files into events. Anything else (deleted, replaced by a directory)
    /// is dropped silently.
    pub fn pop_due(&mut self, now: Instant) -> Vec<FileEvent> {
        let mut ready = Vec::new();
        while self.pending.front().is_some_and(|p| p.due <= now) {
            let Some(entry) = self.pending.pop_front() else {
                break;
            };
            if is_regular_file(&entry.path) {
                ready.push(FileEvent::new(entry.path, entry.discovered_at));
            } else {
                debug!("Dropped {} after settling: no longer a file", entry.path.display());
            }
        }
        ready
    }

    /// When the next entry becomes due, if any.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.front().map(|p| p.due)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Regular file, not following symlinks.
pub fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DELAY: Duration = Duration::from_secs(1);

    #[test]
    fn nothing_is_emitted_before_the_delay() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.pdf");
        fs::write(&path, b"x").unwrap();

        let mut queue = SettleQueue::new(DELAY);
        let t0 = Instant::now();
        queue.push(path.clone(), t0);

        assert!(queue.pop_due(t0 + Duration::from_millis(999)).is_empty());
        let ready = queue.pop_due(t0 + DELAY);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].path, path);
        assert!(queue.is_empty());
    }

    #[test]
    fn file_deleted_while_settling_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.part");
        fs::write(&path, b"x").unwrap();

        let mut queue = SettleQueue::new(DELAY);
        let t0 = Instant::now();
        queue.push(path.clone(), t0);
        fs::remove_file(&path).unwrap();

        assert!(queue.pop_due(t0 + DELAY).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn directories_are_never_emitted() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Images");
        fs::create_dir(&dir).unwrap();

        let mut queue = SettleQueue::new(DELAY);
        let t0 = Instant::now();
        queue.push(dir, t0);
        assert!(queue.pop_due(t0 + DELAY).is_empty());
    }

    #[test]
    fn duplicate_push_is_ignored() {
        let mut queue = SettleQueue::new(DELAY);
        let t0 = Instant::now();
        assert!(queue.push(PathBuf::from("/dl/a"), t0));
        assert!(!queue.push(PathBuf::from("/dl/a"), t0 + Duration::from_millis(10)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn entries_come_out_in_order_of_arrival() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let mut queue = SettleQueue::new(DELAY);
        let t0 = Instant::now();
        queue.push(a.clone(), t0);
        queue.push(b.clone(), t0 + Duration::from_millis(500));
        assert_eq!(queue.next_due(), Some(t0 + DELAY));

        let first = queue.pop_due(t0 + DELAY);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].path, a);

        let second = queue.pop_due(t0 + Duration::from_millis(1_500));
        assert_eq!(second[0].path, b);
    }
}
