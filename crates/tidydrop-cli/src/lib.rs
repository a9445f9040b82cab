/// TidyDrop CLI — command-line frontend.
///
/// This crate contains the terminal surface only. Engine logic lives in
/// `tidydrop-core`.
pub mod app;
pub mod commands;
pub mod logging;
pub mod report;
pub mod state;

pub use app::App;
pub use commands::{Cli, Command};

use clap::Parser;
use tidydrop_core::platform::default_log_dir;
use tracing::{error, info, warn};

/// Parse the command line, set up logging and run the chosen command.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let app = App::from_cli(&cli);

    let _guard = logging::init_logging(app.config.log_level, &default_log_dir());
    info!("TidyDrop starting");
    if let Some(warning) = &app.config_warning {
        warn!("{warning}");
    }

    let mut stdout = std::io::stdout().lock();
    let result = app.run(cli.command.as_ref(), &mut stdout);
    if let Err(err) = &result {
        error!("{err:#}");
    }
    result
}
