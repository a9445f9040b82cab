/// Command handlers.
///
/// An [`App`] is built once from the parsed command line: it resolves the
/// watched directory and the config/stats locations and loads the config.
/// Handlers write their output to any `io::Write` so they can be driven from
/// tests.
use crate::commands::{Cli, Command};
use crate::report::{
    format_folder_report, format_left_in_place, format_scan_summary, format_stats,
    format_stats_line, format_verdict,
};
use crate::state::{WatchPhase, WatchState};
use anyhow::{bail, Context};
use clap::CommandFactory;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tidydrop_core::analysis::folder_report;
use tidydrop_core::classifier::Classifier;
use tidydrop_core::config::OrganizerConfig;
use tidydrop_core::detector::{ensure_readable, DetectorMode, DetectorTiming, StopToken};
use tidydrop_core::organizer::Organizer;
use tidydrop_core::platform::{
    default_config_path, default_downloads_dir, default_stats_path, DesktopNotifier,
};
use tidydrop_core::stats::{JsonStatsStore, StatsSink};
use tracing::info;

/// How often the watch loop drains the organizer channel.
const TICK: Duration = Duration::from_millis(100);

/// Default period of the stats report while watching.
pub const DEFAULT_REPORT_SECS: u64 = 5;

pub struct App {
    pub config: OrganizerConfig,
    pub config_path: PathBuf,
    pub stats_path: PathBuf,
    /// Directory being organized.
    pub dir: PathBuf,
    pub timing: DetectorTiming,
    /// Problem found while loading the config, reported once logging is up.
    pub config_warning: Option<String>,
}

impl App {
    /// Resolve paths and load the config. Never fails; a bad config file
    /// falls back to defaults and is remembered in `config_warning`.
    pub fn from_cli(cli: &Cli) -> Self {
        let config_path = cli.config.clone().unwrap_or_else(default_config_path);
        let (config, problem) = OrganizerConfig::load(&config_path);
        let config_warning =
            problem.map(|err| format!("ignoring config {}: {err}", config_path.display()));

        let dir = cli
            .dir
            .clone()
            .or_else(|| config.downloads_dir.clone())
            .unwrap_or_else(default_downloads_dir);

        Self {
            stats_path: cli.stats.clone().unwrap_or_else(default_stats_path),
            config_path,
            config,
            dir,
            timing: DetectorTiming::default(),
            config_warning,
        }
    }

    fn open_stats(&self) -> Arc<StatsSink> {
        Arc::new(StatsSink::open(Box::new(JsonStatsStore::new(&self.stats_path))))
    }

    fn organizer(&self, stats: Arc<StatsSink>) -> Organizer {
        Organizer::from_config(&self.dir, &self.config, stats, Box::new(DesktopNotifier))
    }

    /// Dispatch `command`. `None` watches when `auto_start` is set and
    /// prints help otherwise.
    pub fn run(&self, command: Option<&Command>, out: &mut dyn Write) -> anyhow::Result<()> {
        match command {
            Some(Command::Scan) => self.scan(out),
            Some(Command::Watch { mode, report_secs }) => {
                let mode = mode.map(DetectorMode::from).unwrap_or(self.config.watch_mode);
                let stop = StopToken::new();
                spawn_quit_listener(stop.clone());
                self.watch(mode, Duration::from_secs(*report_secs), &stop, out)
            }
            Some(Command::Stats) => self.stats(out),
            Some(Command::Classify { files }) => self.classify(files, out),
            Some(Command::Config) => self.show_config(out),
            None if self.config.auto_start => {
                let stop = StopToken::new();
                spawn_quit_listener(stop.clone());
                self.watch(
                    self.config.watch_mode,
                    Duration::from_secs(DEFAULT_REPORT_SECS),
                    &stop,
                    out,
                )
            }
            None => {
                writeln!(out, "{}", Cli::command().render_help())?;
                Ok(())
            }
        }
    }

    /// Organize the directory once and print what happened.
    pub fn scan(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        let organizer = self.organizer(self.open_stats());
        let outcomes = organizer
            .scan_once()
            .with_context(|| format!("cannot organize {}", self.dir.display()))?;
        write!(out, "{}", format_scan_summary(&outcomes))?;
        Ok(())
    }

    /// Startup scan, then watch until `stop` is raised (or the organizer
    /// fails). Prints every outcome and a stats line every `report_every`.
    pub fn watch(
        &self,
        mode: DetectorMode,
        report_every: Duration,
        stop: &StopToken,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let stats = self.open_stats();
        let mut state = WatchState::new();
        state.start(self.organizer(Arc::clone(&stats)), mode, self.timing);
        info!("Watch session started for {}", self.dir.display());

        let mut next_report = Instant::now() + report_every;
        loop {
            for line in state.process_messages() {
                writeln!(out, "{line}")?;
            }
            if matches!(state.phase, WatchPhase::Stopped | WatchPhase::Failed) {
                break;
            }
            if stop.is_stopped() {
                state.stop();
            }
            if Instant::now() >= next_report {
                writeln!(out, "{}", format_stats_line(&stats.snapshot()))?;
                next_report = Instant::now() + report_every;
            }
            thread::sleep(TICK);
        }
        state.finish();

        if let Some(reason) = &state.failure {
            bail!("cannot watch {}: {reason}", self.dir.display());
        }
        writeln!(
            out,
            "Stopped. This session: {} moved, {} left in place.",
            state.moved, state.skipped
        )?;
        write!(out, "{}", format_left_in_place(&state.recent))?;
        Ok(())
    }

    /// Persisted stats plus the folder report.
    pub fn stats(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        let stats = self.open_stats().snapshot();
        write!(out, "{}", format_stats(&stats))?;
        writeln!(out)?;

        let labels = Classifier::new(&self.config.rules).category_labels();
        match ensure_readable(&self.dir) {
            Ok(()) => write!(out, "{}", format_folder_report(&folder_report(&self.dir, &labels)))?,
            Err(err) => writeln!(out, "Folder report unavailable: {err}")?,
        }
        Ok(())
    }

    /// Dry run: classify each file without touching it.
    pub fn classify(&self, files: &[PathBuf], out: &mut dyn Write) -> anyhow::Result<()> {
        let classifier = Classifier::new(&self.config.rules);
        for file in files {
            writeln!(out, "{}", format_verdict(file, &classifier.classify(file)))?;
        }
        Ok(())
    }

    pub fn show_config(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        writeln!(out, "# config file: {}", display_or_missing(&self.config_path))?;
        writeln!(out, "# stats file:  {}", self.stats_path.display())?;
        writeln!(out, "# directory:   {}", self.dir.display())?;
        writeln!(out, "{}", self.config.to_json()?)?;
        Ok(())
    }
}

fn display_or_missing(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    }
}

/// Raise `stop` when the user types `q` + Enter. End of input (e.g. stdin
/// redirected from /dev/null) leaves the watcher running.
fn spawn_quit_listener(stop: StopToken) {
    let spawned = thread::Builder::new()
        .name("tidydrop-stdin".into())
        .spawn(move || {
            let stdin = io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if line.trim().eq_ignore_ascii_case("q") => {
                        stop.stop();
                        break;
                    }
                    Ok(_) => {}
                }
            }
        });
    if let Err(err) = spawned {
        tracing::warn!("Cannot read stdin, stop with Ctrl+C instead: {err}");
    }
}
