/// Default locations, resolved through the `dirs` crate.
use std::path::PathBuf;

/// Subdirectory used under the platform config and data directories.
pub const APP_DIR: &str = "tidydrop";
pub const CONFIG_FILE_NAME: &str = "organizer_config.json";
pub const STATS_FILE_NAME: &str = "organizer_stats.json";
pub const LOG_FILE_NAME: &str = "organizer.log";

/// The user's download folder: the platform's own notion of it when there is
/// one, `~/Downloads` otherwise, and `./Downloads` as a last resort.
pub fn default_downloads_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

/// `<config dir>/tidydrop/organizer_config.json`.
pub fn default_config_path() -> PathBuf {
    base_dir(dirs::config_dir()).join(CONFIG_FILE_NAME)
}

/// `<data dir>/tidydrop/organizer_stats.json`.
pub fn default_stats_path() -> PathBuf {
    base_dir(dirs::data_dir()).join(STATS_FILE_NAME)
}

/// `<data dir>/tidydrop/logs`.
pub fn default_log_dir() -> PathBuf {
    base_dir(dirs::data_dir()).join("logs")
}

/// Falls back to the working directory when the platform has no such
/// directory (e.g. `$HOME` unset).
fn base_dir(platform_dir: Option<PathBuf>) -> PathBuf {
    platform_dir
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_files_live_under_app_dir() {
        let config = default_config_path();
        assert!(config.ends_with(CONFIG_FILE_NAME));
        let stats = default_stats_path();
        assert!(stats.ends_with(STATS_FILE_NAME));
        assert_eq!(stats.parent(), default_log_dir().parent());
    }

    #[test]
    fn base_dir_without_platform_dir_is_cwd() {
        assert_eq!(base_dir(None), PathBuf::from("."));
        assert_eq!(
            base_dir(Some(PathBuf::from("/cfg"))),
            PathBuf::from("/cfg").join(APP_DIR)
        );
    }
}
