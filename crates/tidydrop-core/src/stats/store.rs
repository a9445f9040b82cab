/// Persistence back-ends for [`Stats`](super::Stats).
use super::Stats;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Where stats are loaded from and saved to.
pub trait StatsStore: Send + Sync {
    /// Load the stored stats. A missing store is [`Error::NotFound`].
    fn load(&self) -> Result<Stats>;
    fn save(&self, stats: &Stats) -> Result<()>;
}

/// Pretty-printed JSON file, e.g. `organizer_stats.json`.
#[derive(Debug, Clone)]
pub struct JsonStatsStore {
    path: PathBuf,
}

impl JsonStatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsStore for JsonStatsStore {
    fn load(&self) -> Result<Stats> {
        let text = fs::read_to_string(&self.path).map_err(|e| Error::from_io(&self.path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Writes to a sibling temp file and renames it over the target so a
    /// crash mid-write never leaves a truncated document.
    fn save(&self, stats: &Stats) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
            }
        }
        let json = serde_json::to_string_pretty(stats)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::from_io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| Error::from_io(&self.path, e))
    }
}

/// In-memory store for tests and dry runs. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatsStore {
    slot: Arc<Mutex<Option<Stats>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStatsStore {
    pub fn with_stats(stats: Stats) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(stats))),
            saves: Arc::default(),
        }
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl StatsStore for MemoryStatsStore {
    fn load(&self) -> Result<Stats> {
        self.slot
            .lock()
            .clone()
            .ok_or_else(|| Error::NotFound(PathBuf::from("<memory>")))
    }

    fn save(&self, stats: &Stats) -> Result<()> {
        *self.slot.lock() = Some(stats.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
