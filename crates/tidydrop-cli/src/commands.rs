/// Command-line surface.
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tidydrop_core::detector::DetectorMode;

#[derive(Debug, Parser)]
#[command(name = "tidydrop", version)]
#[command(about = "Keeps a download folder tidy by sorting new files into category folders")]
pub struct Cli {
    /// Directory to organize (defaults to the configured or platform download folder)
    #[arg(long, global = true, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Config file (defaults to <config dir>/tidydrop/organizer_config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stats file (defaults to <data dir>/tidydrop/organizer_stats.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub stats: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Organize every file currently in the directory once, then exit
    Scan,
    /// Organize existing files, then keep watching for new ones (type q + Enter to stop)
    Watch {
        /// Change detection strategy (defaults to the configured mode)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Seconds between stats reports
        #[arg(long, default_value_t = 5, value_name = "N")]
        report_secs: u64,
    },
    /// Show organized-file statistics and the size of each category folder
    Stats,
    /// Show how files would be classified, without moving anything
    Classify {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Auto,
    Events,
    Polling,
}

impl From<ModeArg> for DetectorMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => DetectorMode::Auto,
            ModeArg::Events => DetectorMode::Events,
            ModeArg::Polling => DetectorMode::Polling,
        }
    }
}
