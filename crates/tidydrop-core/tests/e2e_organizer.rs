/// End-to-end organizer integration tests.
///
/// These tests run the real classifier, relocator, stats sink and background
/// organizer thread against a real temporary directory. Nothing is mocked
/// except the stats store, which is kept in memory so runs are independent.
use crossbeam_channel::RecvTimeoutError;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tidydrop_core::classifier::Classifier;
use tidydrop_core::detector::{DetectorMode, DetectorTiming};
use tidydrop_core::model::{RelocationOutcome, SensitiveMatch, SkipReason};
use tidydrop_core::organizer::{start_organizer, Organizer, OrganizerHandle, OrganizerMessage};
use tidydrop_core::stats::{JsonStatsStore, MemoryStatsStore, StatsSink, StatsStore};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// The reference download folder:
///
/// ```text
/// root/
///   report.pdf           → Documents
///   secret_password.txt  → sensitive (name)
///   data.csv             → sensitive (content, first line)
///   note.xyz             → unmapped
/// ```
fn build_downloads(root: &Path) {
    fs::write(root.join("report.pdf"), b"%PDF-1.7 quarterly numbers").unwrap();
    fs::write(root.join("secret_password.txt"), b"hunter2").unwrap();
    fs::write(root.join("data.csv"), b"password,user\nabc,bob\n").unwrap();
    fs::write(root.join("note.xyz"), b"?").unwrap();
}

fn organizer(root: &Path) -> Organizer {
    let stats = Arc::new(StatsSink::open(Box::new(MemoryStatsStore::default())));
    Organizer::new(root, Classifier::default(), stats)
}

fn find<'a>(outcomes: &'a [RelocationOutcome], name: &str) -> &'a RelocationOutcome {
    outcomes
        .iter()
        .find(|o| o.original_name == name)
        .unwrap_or_else(|| panic!("no outcome for {name}"))
}

fn quick_timing() -> DetectorTiming {
    DetectorTiming {
        debounce: Duration::from_millis(500),
        event_settle: Duration::from_millis(100),
        poll_interval: Duration::from_millis(100),
        poll_settle: Duration::from_millis(100),
    }
}

/// Wait (up to 10 s) for the message matching `pred`.
fn wait_for(
    handle: &OrganizerHandle,
    mut pred: impl FnMut(&OrganizerMessage) -> bool,
) -> OrganizerMessage {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        assert!(!left.is_zero(), "expected message did not arrive within 10 s");
        match handle.receiver.recv_timeout(left) {
            Ok(msg) if pred(&msg) => return msg,
            Ok(_) => continue,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => panic!("organizer channel closed"),
        }
    }
}

fn moved_named(msg: &OrganizerMessage, name: &str) -> bool {
    matches!(msg, OrganizerMessage::Outcome(o) if o.original_name == name && o.is_moved())
}

// ── Single scan ─────────────────────────────────────────────────────────────

#[test]
fn reference_scan_moves_one_and_explains_three() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_downloads(tmp.path());

    let org = organizer(tmp.path());
    let outcomes = org.scan_once().unwrap();
    assert_eq!(outcomes.len(), 4);

    let report = find(&outcomes, "report.pdf");
    let dest = tmp.path().join("Documents").join("report.pdf");
    assert_eq!(report.destination(), Some(&dest));
    assert_eq!(fs::read(&dest).unwrap(), b"%PDF-1.7 quarterly numbers");
    assert!(!tmp.path().join("report.pdf").exists());

    assert!(matches!(
        find(&outcomes, "secret_password.txt").skip_reason(),
        Some(SkipReason::Sensitive(SensitiveMatch::NameKeyword(_)))
    ));
    assert!(matches!(
        find(&outcomes, "data.csv").skip_reason(),
        Some(SkipReason::Sensitive(SensitiveMatch::ContentKeyword(_)))
    ));
    assert_eq!(
        find(&outcomes, "note.xyz").skip_reason(),
        Some(&SkipReason::Unmapped)
    );

    for name in ["secret_password.txt", "data.csv", "note.xyz"] {
        assert!(tmp.path().join(name).is_file(), "{name} must stay put");
    }
    assert_eq!(org.stats().snapshot().total_organized, 1);
}

/// A second scan moves nothing and reports the same three skips.
#[test]
fn second_scan_is_idempotent() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_downloads(tmp.path());
    let org = organizer(tmp.path());

    org.scan_once().unwrap();
    let second = org.scan_once().unwrap();

    assert_eq!(second.len(), 3);
    assert!(second.iter().all(|o| !o.is_moved()));
    assert_eq!(org.stats().snapshot().total_organized, 1);
    assert!(!tmp.path().join("Documents").join("report_1.pdf").exists());
}

#[test]
fn n_moves_match_every_counter() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    for i in 0..5 {
        fs::write(tmp.path().join(format!("track{i}.mp3")), b"ID3").unwrap();
    }
    let org = organizer(tmp.path());
    org.scan_once().unwrap();

    let stats = org.stats().snapshot();
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    assert_eq!(stats.total_organized, 5);
    assert_eq!(stats.by_category["Audio"], 5);
    assert_eq!(stats.by_date[&today], 5);
}

/// Same name downloaded twice keeps both copies.
#[test]
fn repeated_download_gets_suffixed() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let org = organizer(tmp.path());

    fs::write(tmp.path().join("invoice.pdf"), b"first").unwrap();
    org.scan_once().unwrap();
    fs::write(tmp.path().join("invoice.pdf"), b"second").unwrap();
    org.scan_once().unwrap();

    let docs = tmp.path().join("Documents");
    assert_eq!(fs::read(docs.join("invoice.pdf")).unwrap(), b"first");
    assert_eq!(fs::read(docs.join("invoice_1.pdf")).unwrap(), b"second");
}

#[test]
fn stats_survive_a_restart() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let downloads = tmp.path().join("Downloads");
    fs::create_dir(&downloads).unwrap();
    let stats_path = tmp.path().join("organizer_stats.json");

    fs::write(downloads.join("a.png"), b"png").unwrap();
    {
        let sink = Arc::new(StatsSink::open(Box::new(JsonStatsStore::new(&stats_path))));
        Organizer::new(&downloads, Classifier::default(), sink)
            .scan_once()
            .unwrap();
    }

    fs::write(downloads.join("b.png"), b"png").unwrap();
    let sink = Arc::new(StatsSink::open(Box::new(JsonStatsStore::new(&stats_path))));
    let org = Organizer::new(&downloads, Classifier::default(), sink);
    org.scan_once().unwrap();

    assert_eq!(org.stats().snapshot().by_category["Images"], 2);
    let on_disk = JsonStatsStore::new(&stats_path).load().unwrap();
    assert_eq!(on_disk.total_organized, 2);
}

// ── Background thread ───────────────────────────────────────────────────────

fn watch_picks_up_new_file(mode: DetectorMode) {
    let tmp = TempDir::new().expect("failed to create temp dir");
    fs::write(tmp.path().join("old.zip"), b"PK").unwrap();

    let handle = start_organizer(organizer(tmp.path()), mode, quick_timing());

    // Startup scan handles what was already there.
    wait_for(&handle, |m| moved_named(m, "old.zip"));
    wait_for(&handle, |m| matches!(m, OrganizerMessage::ScanComplete { moved: 1, .. }));

    fs::write(tmp.path().join("fresh.mp4"), b"video").unwrap();
    wait_for(&handle, |m| moved_named(m, "fresh.mp4"));

    assert!(tmp.path().join("Archives").join("old.zip").is_file());
    assert!(tmp.path().join("Video").join("fresh.mp4").is_file());

    handle.stop();
    wait_for(&handle, |m| matches!(m, OrganizerMessage::Stopped));
    handle.join();
}

#[test]
fn polling_watch_picks_up_new_file() {
    watch_picks_up_new_file(DetectorMode::Polling);
}

#[test]
fn auto_watch_picks_up_new_file() {
    watch_picks_up_new_file(DetectorMode::Auto);
}

#[test]
fn watch_reports_the_mode_in_use() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let handle = start_organizer(organizer(tmp.path()), DetectorMode::Polling, quick_timing());
    let msg = wait_for(&handle, |m| matches!(m, OrganizerMessage::Watching { .. }));
    match msg {
        OrganizerMessage::Watching { mode, .. } => assert_eq!(mode, DetectorMode::Polling),
        _ => unreachable!(),
    }
    handle.join();
}

/// A sensitive file dropped while watching is reported but left alone.
#[test]
fn watch_leaves_sensitive_arrivals_alone() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let handle = start_organizer(organizer(tmp.path()), DetectorMode::Polling, quick_timing());
    wait_for(&handle, |m| matches!(m, OrganizerMessage::ScanComplete { .. }));

    fs::write(tmp.path().join("id_rsa.pem"), b"-----BEGIN").unwrap();
    wait_for(&handle, |m| {
        matches!(m, OrganizerMessage::Outcome(o)
            if o.original_name == "id_rsa.pem"
                && matches!(o.skip_reason(), Some(SkipReason::Sensitive(_))))
    });
    assert!(tmp.path().join("id_rsa.pem").is_file());
    handle.join();
}

#[test]
fn missing_directory_fails_the_thread() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let missing = tmp.path().join("nowhere");
    let handle = start_organizer(organizer(&missing), DetectorMode::Auto, quick_timing());
    wait_for(&handle, |m| matches!(m, OrganizerMessage::Failed(_)));
    handle.join();
}

/// Stop must be honoured quickly even with long polling intervals.
#[test]
fn stop_is_prompt() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let timing = DetectorTiming {
        poll_interval: Duration::from_secs(60),
        ..DetectorTiming::default()
    };
    let handle = start_organizer(organizer(tmp.path()), DetectorMode::Polling, timing);
    wait_for(&handle, |m| matches!(m, OrganizerMessage::ScanComplete { .. }));

    let start = Instant::now();
    handle.stop();
    wait_for(&handle, |m| matches!(m, OrganizerMessage::Stopped));
    assert!(start.elapsed() < Duration::from_secs(2));
    handle.join();
}
