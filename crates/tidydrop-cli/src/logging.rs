/// Logging setup.
///
/// Installs a global tracing subscriber with a console layer (stderr, so
/// command output on stdout stays clean) and, when the log directory can be
/// created, a plain-text file layer written through `tracing-appender`.
/// `RUST_LOG` overrides the configured level.
use std::fs;
use std::path::{Path, PathBuf};
use tidydrop_core::config::LogLevel;
use tidydrop_core::platform::LOG_FILE_NAME;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Keeps the file writer alive; drop it only when the program exits.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
    pub log_file: Option<PathBuf>,
}

/// Initialise logging at `level`, writing a copy to `<log_dir>/organizer.log`.
///
/// Never fails: a log directory that cannot be created degrades to console
/// only, and a second call (e.g. from tests) leaves the first subscriber in
/// place.
pub fn init_logging(level: LogLevel, log_dir: &Path) -> LogGuard {
    let filter = build_env_filter(level);
    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let (file_layer, guard, log_file) = match fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard), Some(log_dir.join(LOG_FILE_NAME)))
        }
        Err(err) => {
            eprintln!(
                "tidydrop: cannot create log directory {}: {err}; logging to console only",
                log_dir.display()
            );
            (None, None, None)
        }
    };

    let installed = Registry::default()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();

    if installed.is_ok() {
        if let Some(path) = &log_file {
            tracing::debug!("Logging to {}", path.display());
        }
    }

    LogGuard {
        _file: guard,
        log_file,
    }
}

/// `RUST_LOG` if set and valid, otherwise the configured level.
fn build_env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_file_lives_in_requested_dir() {
        let tmp = TempDir::new().unwrap();
        let guard = init_logging(LogLevel::Info, &tmp.path().join("logs"));
        assert_eq!(
            guard.log_file.as_deref(),
            Some(tmp.path().join("logs").join(LOG_FILE_NAME).as_path())
        );
        assert!(tmp.path().join("logs").is_dir());
    }

    #[test]
    fn uncreatable_dir_degrades_to_console() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let guard = init_logging(LogLevel::Warn, &blocker.join("logs"));
        assert!(guard.log_file.is_none());
    }
}
