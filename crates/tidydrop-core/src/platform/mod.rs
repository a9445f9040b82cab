/// Platform glue — locating the download folder and the per-user config and
/// data directories, plus desktop notifications.
pub mod notifications;
pub mod paths;

pub use notifications::{
    DesktopNotifier, Notifier, NullNotifier, QueuedNotifier, NOTIFICATION_QUEUE_CAPACITY,
};
pub use paths::{
    default_config_path, default_downloads_dir, default_log_dir, default_stats_path, APP_DIR,
    CONFIG_FILE_NAME, LOG_FILE_NAME, STATS_FILE_NAME,
};
