/// Per-path debounce for raw filesystem notifications.
///
/// One download usually produces a burst of notifications for the same path
/// (create, several writes, a rename). The registry admits the first and
/// drops the rest until the window has elapsed.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Hard cap on remembered paths.
///
/// Expired entries are pruned first; if the registry is still full the oldest
/// entry is evicted to make room.
pub const MAX_COOLDOWN_ENTRIES: usize = 4_096;

#[derive(Debug, Clone)]
pub struct CooldownRegistry {
    window: Duration,
    seen: HashMap<PathBuf, Instant>,
}

impl CooldownRegistry {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// `true` if `path` has not been admitted within the window before `now`.
    ///
    /// Only admitted notifications refresh the timestamp, so a steady trickle
    /// of events cannot keep a path suppressed forever.
    pub fn admit(&mut self, path: &Path, now: Instant) -> bool {
        if let Some(last) = self.seen.get(path) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        }

        if self.seen.len() >= MAX_COOLDOWN_ENTRIES && !self.seen.contains_key(path) {
            self.prune(now);
            if self.seen.len() >= MAX_COOLDOWN_ENTRIES {
                self.evict_oldest();
            }
        }

        self.seen.insert(path.to_path_buf(), now);
        true
    }

    /// Forget every entry whose window has elapsed.
    pub fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.seen
            .retain(|_, last| now.saturating_duration_since(*last) < window);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .seen
            .iter()
            .min_by_key(|(_, last)| **last)
            .map(|(path, _)| path.clone());
        if let Some(path) = oldest {
            self.seen.remove(&path);
        }
    }
}
