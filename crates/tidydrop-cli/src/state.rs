/// Watch-session state.
///
/// Centralises what the watch command knows about the running organizer.
/// The organizer thread communicates via its channel; state updates happen
/// in [`WatchState::process_messages`], which the watch loop calls once per
/// tick.
use crate::report::format_outcome;
use crossbeam_channel::TryRecvError;
use std::collections::VecDeque;
use std::path::PathBuf;
use tidydrop_core::detector::{DetectorMode, DetectorTiming, StopToken};
use tidydrop_core::model::RelocationOutcome;
use tidydrop_core::organizer::{start_organizer, Organizer, OrganizerHandle, OrganizerMessage};

/// Maximum messages drained per tick, so a backlog cannot starve the
/// periodic report.
const MAX_MESSAGES_PER_TICK: usize = 200;

/// Most recent outcomes kept for the session summary.
pub const MAX_RECENT_OUTCOMES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    /// Not started.
    Idle,
    /// Thread started, detector not primed yet.
    Starting,
    /// Startup scan running or done; watching for new files.
    Watching,
    Stopped,
    /// The directory could not be watched.
    Failed,
}

pub struct WatchState {
    pub phase: WatchPhase,
    pub dir: Option<PathBuf>,
    /// Strategy actually in use once known.
    pub mode: Option<DetectorMode>,
    pub startup_scan_done: bool,
    /// Files moved this session.
    pub moved: u64,
    /// Files left in place this session.
    pub skipped: u64,
    pub recent: VecDeque<RelocationOutcome>,
    pub failure: Option<String>,
    handle: Option<OrganizerHandle>,
}

impl Default for WatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchState {
    pub fn new() -> Self {
        Self {
            phase: WatchPhase::Idle,
            dir: None,
            mode: None,
            startup_scan_done: false,
            moved: 0,
            skipped: 0,
            recent: VecDeque::new(),
            failure: None,
            handle: None,
        }
    }

    /// Start the organizer thread. Stops any previous session first.
    pub fn start(&mut self, organizer: Organizer, mode: DetectorMode, timing: DetectorTiming) {
        self.stop();
        *self = Self::new();
        self.phase = WatchPhase::Starting;
        self.handle = Some(start_organizer(organizer, mode, timing));
    }

    /// Ask the organizer thread to stop. Non-blocking; the phase changes
    /// once the thread confirms.
    pub fn stop(&self) {
        if let Some(handle) = &self.handle {
            handle.stop();
        }
    }

    pub fn stop_token(&self) -> Option<StopToken> {
        self.handle.as_ref().map(OrganizerHandle::stop_token)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, WatchPhase::Starting | WatchPhase::Watching)
    }

    /// Drain pending organizer messages, update the state and return the
    /// lines worth printing.
    pub fn process_messages(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let Some(handle) = &self.handle else {
            return lines;
        };

        let mut messages = Vec::new();
        let mut disconnected = false;
        while messages.len() < MAX_MESSAGES_PER_TICK {
            match handle.receiver.try_recv() {
                Ok(msg) => messages.push(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        for msg in messages {
            match msg {
                OrganizerMessage::Watching { dir, mode } => {
                    lines.push(format!(
                        "Watching {} ({mode} mode). Type q + Enter to stop.",
                        dir.display()
                    ));
                    self.dir = Some(dir);
                    self.mode = Some(mode);
                    self.phase = WatchPhase::Watching;
                }
                OrganizerMessage::ScanComplete {
                    moved,
                    skipped,
                    duration,
                } => {
                    self.startup_scan_done = true;
                    lines.push(format!(
                        "Startup scan: {moved} moved, {skipped} left in place ({:.1}s)",
                        duration.as_secs_f64()
                    ));
                }
                OrganizerMessage::Outcome(outcome) => {
                    lines.push(format_outcome(&outcome));
                    self.record(outcome);
                }
                OrganizerMessage::Failed(reason) => {
                    lines.push(format!("Cannot watch: {reason}"));
                    self.failure = Some(reason);
                    self.phase = WatchPhase::Failed;
                }
                OrganizerMessage::Stopped => {
                    self.phase = WatchPhase::Stopped;
                }
            }
        }
        // The thread exited without saying so, e.g. it panicked.
        if disconnected && self.is_running() {
            self.phase = WatchPhase::Stopped;
        }
        lines
    }

    /// Wait for the organizer thread to exit and release it.
    pub fn finish(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join();
        }
        if self.is_running() {
            self.phase = WatchPhase::Stopped;
        }
    }

    fn record(&mut self, outcome: RelocationOutcome) {
        if outcome.is_moved() {
            self.moved += 1;
        } else {
            self.skipped += 1;
        }
        if self.recent.len() >= MAX_RECENT_OUTCOMES {
            self.recent.pop_front();
        }
        self.recent.push_back(outcome);
    }
}
