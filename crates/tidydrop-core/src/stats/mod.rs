/// Stats sink — running totals of organized files.
///
/// Counters only ever grow, and only on a successful move. The total, the
/// per-category counter and the per-day counter are bumped together under one
/// lock so a snapshot never shows them out of step. After each mutation the
/// snapshot is handed to the injected [`StatsStore`]; persistence failures are
/// logged and otherwise ignored.
pub mod store;

pub use store::{JsonStatsStore, MemoryStatsStore, StatsStore};

use crate::model::RelocationOutcome;
use chrono::{Local, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Persisted statistics document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_organized: u64,
    /// Category label → files moved into it.
    #[serde(default)]
    pub by_category: BTreeMap<String, u64>,
    /// `YYYY-MM-DD` → files moved that day.
    #[serde(default)]
    pub by_date: BTreeMap<String, u64>,
    /// When counting started.
    pub start_date: NaiveDateTime,
}

impl Stats {
    /// Empty stats starting now.
    pub fn fresh() -> Self {
        Self::starting_at(Local::now().naive_local())
    }

    pub fn starting_at(start_date: NaiveDateTime) -> Self {
        Self {
            total_organized: 0,
            by_category: BTreeMap::new(),
            by_date: BTreeMap::new(),
            start_date,
        }
    }

    /// Count one move into `category` on `date`.
    pub fn count_move(&mut self, category: &str, date: NaiveDate) {
        self.total_organized += 1;
        *self.by_category.entry(category.to_owned()).or_default() += 1;
        *self.by_date.entry(date_key(date)).or_default() += 1;
    }

    /// Files moved on `date`.
    pub fn on_date(&self, date: NaiveDate) -> u64 {
        self.by_date.get(&date_key(date)).copied().unwrap_or(0)
    }

    pub fn today(&self) -> u64 {
        self.on_date(Local::now().date_naive())
    }

    /// Categories ordered by count, largest first; ties by label.
    pub fn top_categories(&self) -> Vec<(&str, u64)> {
        let mut out: Vec<(&str, u64)> = self
            .by_category
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        out
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::fresh()
    }
}

/// Key format used by `by_date`.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Owns the live [`Stats`] and writes them through a [`StatsStore`].
pub struct StatsSink {
    stats: Mutex<Stats>,
    store: Box<dyn StatsStore>,
}

impl StatsSink {
    /// Load existing stats from `store`, or start fresh if there are none or
    /// they cannot be read.
    pub fn open(store: Box<dyn StatsStore>) -> Self {
        let stats = match store.load() {
            Ok(stats) => stats,
            Err(err) if err.is_not_found() => {
                debug!("No stored stats yet, starting fresh");
                Stats::fresh()
            }
            Err(err) => {
                warn!("Could not load stats, starting fresh: {err}");
                Stats::fresh()
            }
        };
        Self::with_stats(stats, store)
    }

    pub fn with_stats(stats: Stats, store: Box<dyn StatsStore>) -> Self {
        Self {
            stats: Mutex::new(stats),
            store,
        }
    }

    /// Fold one outcome in, dated today. Returns `true` if it counted.
    pub fn record(&self, outcome: &RelocationOutcome) -> bool {
        self.record_on(outcome, Local::now().date_naive())
    }

    /// Fold one outcome in, dated `date`.
    ///
    /// Skipped outcomes and moves without a concrete category are ignored.
    pub fn record_on(&self, outcome: &RelocationOutcome, date: NaiveDate) -> bool {
        if !outcome.is_moved() {
            return false;
        }
        let Some(label) = outcome.category.label() else {
            return false;
        };

        let snapshot = {
            let mut stats = self.stats.lock();
            stats.count_move(label, date);
            stats.clone()
        };

        if let Err(err) = self.store.save(&snapshot) {
            warn!("Could not save stats: {err}");
        }
        true
    }

    /// Consistent copy of the current stats.
    pub fn snapshot(&self) -> Stats {
        self.stats.lock().clone()
    }
}
