/// Desktop notifications, best effort.
///
/// Arguments are passed to the helper program directly (never through a
/// shell), so file names cannot inject commands. A missing helper or a
/// non-zero exit is logged at debug level and otherwise ignored.
///
/// Helpers can hang (e.g. `notify-send` without a D-Bus session), so the
/// organizer never calls one directly: notifications go through a
/// [`QueuedNotifier`] and are delivered on their own thread.
use crossbeam_channel::{bounded, Sender};
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, warn};

/// Notifications waiting for delivery. Further ones are dropped while full.
pub const NOTIFICATION_QUEUE_CAPACITY: usize = 32;

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Does nothing. Used when notifications are switched off and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}

/// `notify-send` on Linux and the BSDs, `osascript` on macOS, nothing
/// elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        let Some(mut cmd) = notification_command(title, body) else {
            return;
        };
        let result = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match result {
            Ok(status) if status.success() => {}
            Ok(status) => debug!("Notification helper exited with {status}"),
            Err(err) => debug!("Notification helper unavailable: {err}"),
        }
    }
}

/// Forwards notifications to `inner` on a `tidydrop-notify` thread.
///
/// `notify` only does a `try_send`, so it never blocks. The thread exits once
/// the queue is dropped and drained.
pub struct QueuedNotifier {
    tx: Option<Sender<(String, String)>>,
}

impl QueuedNotifier {
    pub fn new(inner: Box<dyn Notifier>) -> Self {
        let (tx, rx) = bounded::<(String, String)>(NOTIFICATION_QUEUE_CAPACITY);
        let spawned = thread::Builder::new()
            .name("tidydrop-notify".into())
            .spawn(move || {
                for (title, body) in rx {
                    inner.notify(&title, &body);
                }
            });
        match spawned {
            Ok(_) => Self { tx: Some(tx) },
            Err(err) => {
                warn!("Cannot start notification thread, notifications are off: {err}");
                Self { tx: None }
            }
        }
    }
}

impl Notifier for QueuedNotifier {
    fn notify(&self, title: &str, body: &str) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.try_send((title.to_owned(), body.to_owned())).is_err() {
            debug!("Notification queue full, dropping \"{title}\"");
        }
    }
}

#[cfg(target_os = "macos")]
fn notification_command(title: &str, body: &str) -> Option<Command> {
    let script = format!(
        "display notification {} with title {}",
        applescript_string(body),
        applescript_string(title)
    );
    let mut cmd = Command::new("osascript");
    cmd.arg("-e").arg(script);
    Some(cmd)
}

#[cfg(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
fn notification_command(title: &str, body: &str) -> Option<Command> {
    let mut cmd = Command::new("notify-send");
    cmd.arg("--app-name=TidyDrop").arg(title).arg(body);
    Some(cmd)
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "linux",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
)))]
fn notification_command(_title: &str, _body: &str) -> Option<Command> {
    None
}

/// Quote `text` as an AppleScript string literal.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn applescript_string(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
