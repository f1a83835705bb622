use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use filetime::FileTime;
use tokio::sync::broadcast::error::TryRecvError;

use filevalet_core::{
    Action, Condition, ConfigSnapshot, DateUnit, Folder, MatchPolicy, PolicySpan, Rule, RuleId,
    SnapshotStore, Subject, TrashPolicy, Unit, Verb,
};
use filevalet_ops::{ActionExecutor, EvictionManager, TrashBin};
use filevalet_rules::{AlwaysConfirm, RuleEngine};
use filevalet_watch::{Monitor, MonitorConfig, MonitorEvent, Scheduler};

fn rule(id: &str, conditions: Vec<Condition>, action: Action) -> Rule {
    Rule::new(RuleId::new(id), id.to_string(), MatchPolicy::All, conditions, action).unwrap()
}

fn ext_is(ext: &str) -> Condition {
    Condition::new(Subject::Extension, Verb::Is, ext, None).unwrap()
}

fn setup(
    dir: &Path,
    folders: Vec<Folder>,
    config: MonitorConfig,
) -> (Monitor, Arc<TrashBin>, Arc<SnapshotStore>) {
    let bin = Arc::new(TrashBin::open(dir.join("trash")).unwrap());
    let engine = Arc::new(RuleEngine::new(
        ActionExecutor::new(bin.clone()),
        Arc::new(AlwaysConfirm),
    ));
    let store = Arc::new(SnapshotStore::new(ConfigSnapshot {
        folders,
        trash_policy: None,
    }));
    let monitor = Monitor::new(engine, store.clone(), config).unwrap();
    (monitor, bin, store)
}

fn backdate(path: &Path, days: u64) {
    let mtime = SystemTime::now() - Duration::from_secs(days * 86_400);
    filetime::set_file_mtime(path, FileTime::from_system_time(mtime)).unwrap();
}

async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scan_pass_moves_old_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let watched = dir.path().join("watched");
    let archive = dir.path().join("archive");
    std::fs::create_dir_all(&watched).unwrap();
    std::fs::create_dir_all(&archive).unwrap();

    let report = watched.join("report.pdf");
    std::fs::write(&report, vec![b'x'; 2 * 1024 * 1024]).unwrap();
    backdate(&report, 10);
    let fresh = watched.join("fresh.pdf");
    std::fs::write(&fresh, b"new").unwrap();

    let folders = vec![Folder::new(&watched, false).with_rules(vec![rule(
        "archive-old-pdfs",
        vec![
            ext_is("pdf"),
            Condition::new(
                Subject::DateModified,
                Verb::GreaterThan,
                "7",
                Some(Unit::Date(DateUnit::Days)),
            )
            .unwrap(),
        ],
        Action::move_to(&archive),
    )])];
    let (monitor, _bin, _store) = setup(dir.path(), folders, MonitorConfig::default());

    let outcomes = monitor.scan_folder_now(&watched).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].outcome.is_success());

    assert!(archive.join("report.pdf").exists());
    assert!(!report.exists());
    // The fresh file fails the age condition and stays put.
    assert!(fresh.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_event_burst_dispatches_once() {
    let dir = tempfile::tempdir().unwrap();
    let watched = dir.path().join("watched");
    let copies = dir.path().join("copies");
    std::fs::create_dir_all(&watched).unwrap();
    std::fs::create_dir_all(&copies).unwrap();

    let folders = vec![Folder::new(&watched, false).with_rules(vec![rule(
        "copy-logs",
        vec![ext_is("log")],
        Action::copy_to(&copies),
    )])];
    let config = MonitorConfig::builder()
        .scan_period(Duration::from_secs(60))
        .debounce_window(Some(Duration::from_millis(400)))
        .build()
        .unwrap();
    let (monitor, _bin, _store) = setup(dir.path(), folders, config);

    let mut events = monitor.subscribe();
    monitor.add_folder(&watched, false).await.unwrap();
    monitor.start().await;

    // A burst of rapid writes to one path within the debounce window.
    let target = watched.join("app.log");
    for i in 0..5u8 {
        std::fs::write(&target, vec![i; 16]).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(
        wait_until(Duration::from_secs(5), || copies.join("app.log").exists()).await,
        "burst never dispatched"
    );
    // Allow any residual settles to fire before counting.
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let mut dispatches = 0;
    loop {
        match events.try_recv() {
            Ok(MonitorEvent::Outcomes { outcomes, .. }) => {
                dispatches += outcomes.iter().filter(|o| o.path == target).count();
            }
            Ok(_) => {}
            Err(TryRecvError::Empty) => break,
            Err(_) => break,
        }
    }
    assert_eq!(dispatches, 1, "a settled burst must dispatch exactly once");

    monitor.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remove_folder_stops_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let watched = dir.path().join("watched");
    let dest = dir.path().join("dest");
    std::fs::create_dir_all(&watched).unwrap();
    std::fs::create_dir_all(&dest).unwrap();

    let folders = vec![Folder::new(&watched, false).with_rules(vec![rule(
        "move-txt",
        vec![ext_is("txt")],
        Action::move_to(&dest),
    )])];
    let config = MonitorConfig::builder()
        .scan_period(Duration::from_secs(60))
        .debounce_window(Some(Duration::from_millis(100)))
        .build()
        .unwrap();
    let (monitor, _bin, _store) = setup(dir.path(), folders, config);

    let mut events = monitor.subscribe();
    monitor.add_folder(&watched, false).await.unwrap();
    monitor.start().await;
    monitor.remove_folder(&watched).await.unwrap();

    // No watch is left: a matching file must stay where it is.
    let file = watched.join("late.txt");
    std::fs::write(&file, b"too late").unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert!(file.exists());
    assert!(!dest.join("late.txt").exists());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    monitor.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_folder_twice_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let watched = dir.path().join("watched");
    std::fs::create_dir_all(&watched).unwrap();

    let (monitor, _bin, _store) = setup(dir.path(), vec![], MonitorConfig::default());
    monitor.add_folder(&watched, false).await.unwrap();
    assert!(monitor.add_folder(&watched, true).await.is_err());
    assert_eq!(monitor.watched_folders().await.len(), 1);

    monitor.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_folder_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good");
    std::fs::create_dir_all(&good).unwrap();
    let missing = dir.path().join("never-created");

    let (monitor, _bin, _store) = setup(dir.path(), vec![], MonitorConfig::default());
    let mut events = monitor.subscribe();

    monitor.add_folder(&good, false).await.unwrap();
    monitor.start().await;

    // The bad folder fails alone; the good one keeps its watch.
    assert!(monitor.add_folder(&missing, false).await.is_err());
    assert!(matches!(
        events.try_recv(),
        Ok(MonitorEvent::FolderUnavailable { .. })
    ));
    assert_eq!(monitor.watched_folders().await, vec![good]);

    monitor.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scheduler_scan_and_trash_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let watched = dir.path().join("watched");
    let dest = dir.path().join("dest");
    std::fs::create_dir_all(&watched).unwrap();
    std::fs::create_dir_all(&dest).unwrap();

    // Drop the file in before any watch exists: only the fallback scan
    // can find it.
    let file = watched.join("report.pdf");
    std::fs::write(&file, b"pdf").unwrap();

    let folders = vec![Folder::new(&watched, false).with_rules(vec![rule(
        "move-pdf",
        vec![ext_is("pdf")],
        Action::move_to(&dest),
    )])];
    let config = MonitorConfig::builder()
        .scan_period(Duration::from_millis(150))
        .build()
        .unwrap();
    let (monitor, bin, store) = setup(dir.path(), folders, config);

    // A recycled file awaiting the age-0 sweep.
    let doomed = dir.path().join("old.log");
    std::fs::write(&doomed, b"old").unwrap();
    bin.recycle(&doomed).unwrap();
    let snapshot = ConfigSnapshot {
        folders: store.current().folders.clone(),
        trash_policy: Some(TrashPolicy {
            age_limit: Some(PolicySpan::new(0, DateUnit::Days)),
            ..Default::default()
        }),
    };
    store.publish(snapshot);

    monitor.add_folder(&watched, false).await.unwrap();
    let scheduler = Scheduler::spawn(
        monitor.clone(),
        Arc::new(EvictionManager::new(bin.clone())),
        store.clone(),
        Duration::from_millis(150),
    );

    assert!(
        wait_until(Duration::from_secs(5), || dest.join("report.pdf").exists()).await,
        "fallback scan never dispatched the file"
    );
    assert!(
        wait_until(Duration::from_secs(5), || bin.entries().is_empty()).await,
        "eviction sweep never emptied the bin"
    );

    scheduler.shutdown().await;
    monitor.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_snapshot_swap_applies_to_next_pass() {
    let dir = tempfile::tempdir().unwrap();
    let watched = dir.path().join("watched");
    let dest = dir.path().join("dest");
    std::fs::create_dir_all(&watched).unwrap();
    std::fs::create_dir_all(&dest).unwrap();
    std::fs::write(watched.join("a.txt"), b"x").unwrap();

    let move_rule = rule("move-txt", vec![ext_is("txt")], Action::move_to(&dest));
    let folders = vec![Folder::new(&watched, false).with_rules(vec![move_rule.clone()])];
    let (monitor, _bin, store) = setup(dir.path(), folders, MonitorConfig::default());

    // Disable the rule via a published snapshot: the next pass sees it.
    store.publish(ConfigSnapshot {
        folders: vec![Folder::new(&watched, false).with_rules(vec![move_rule.disabled()])],
        trash_policy: None,
    });
    let outcomes = monitor.scan_folder_now(&watched).await.unwrap();
    assert!(outcomes.is_empty());
    assert!(watched.join("a.txt").exists());
}
