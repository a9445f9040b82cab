/// TidyDrop Core — classification, safe relocation and change detection for
/// a download folder.
///
/// This crate contains all engine logic with no terminal dependencies. It is
/// designed to be reusable across different frontends (CLI, tray app, TUI).
///
/// # Modules
///
/// - [`model`] — Categories, file events and per-file outcomes.
/// - [`classifier`] — Extension → category mapping and the sensitive-file rules.
/// - [`relocator`] — Collision-safe move into `<root>/<category>/`.
/// - [`stats`] — Running counters and their persistence.
/// - [`detector`] — Notification and polling change detectors.
/// - [`organizer`] — The background watch loop tying everything together.
/// - [`analysis`] — Per-category folder report.
/// - [`config`] — The persisted JSON configuration.
/// - [`platform`] — Default paths and desktop notifications.
pub mod analysis;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod error;
pub mod model;
pub mod organizer;
pub mod platform;
pub mod relocator;
pub mod stats;

pub use error::{Error, Result};
