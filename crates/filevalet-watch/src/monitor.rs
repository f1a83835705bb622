//! The directory monitor.
//!
//! One debounced watch and one worker per folder. Settled event batches
//! and periodic scans are both queued to the folder's worker, which
//! serializes rule application: the event path and the scan path can
//! never run a pass over the same folder simultaneously.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebouncedEvent, Debouncer, RecommendedCache, new_debouncer};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use filevalet_core::{RuleId, SnapshotStore};
use filevalet_rules::{RuleEngine, RuleOutcome};

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::scan;

const EVENT_CHANNEL_SIZE: usize = 256;

/// Notifications the monitor publishes for the GUI/config layer.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// One dispatch batch for a folder produced these outcomes.
    Outcomes {
        folder: PathBuf,
        outcomes: Vec<OutcomeReport>,
    },
    /// A folder's watch could not be installed or kept alive; monitoring
    /// of other folders continues unaffected.
    FolderUnavailable { path: PathBuf, reason: String },
}

/// A rendered rule outcome: file, rule and what happened.
#[derive(Debug, Clone)]
pub struct OutcomeReport {
    pub path: PathBuf,
    pub rule_id: RuleId,
    pub rule_name: String,
    pub status: OutcomeStatus,
}

/// Reportable status of one executed action.
#[derive(Debug, Clone)]
pub enum OutcomeStatus {
    Succeeded { destination: Option<PathBuf> },
    Skipped { reason: String },
    Failed { error: String },
}

impl From<&RuleOutcome> for OutcomeReport {
    fn from(outcome: &RuleOutcome) -> Self {
        use filevalet_ops::ActionOutcome;

        let status = match &outcome.outcome {
            ActionOutcome::Succeeded { destination, .. } => OutcomeStatus::Succeeded {
                destination: destination.clone(),
            },
            ActionOutcome::Skipped(reason) => OutcomeStatus::Skipped {
                reason: reason.to_string(),
            },
            ActionOutcome::Failed(error) => OutcomeStatus::Failed {
                error: error.to_string(),
            },
        };
        Self {
            path: outcome.path.clone(),
            rule_id: outcome.rule_id.clone(),
            rule_name: outcome.rule_name.clone(),
            status,
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded { destination: Some(dest) } => {
                write!(f, "succeeded -> {}", dest.display())
            }
            Self::Succeeded { destination: None } => write!(f, "succeeded"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Work queued to a folder's worker.
#[derive(Debug)]
enum WorkItem {
    /// Paths whose events settled within the debounce window.
    Settled(Vec<PathBuf>),
    /// Walk the whole folder and dispatch every file.
    Scan,
}

/// Per-folder watch state.
struct FolderWatch {
    recursive: bool,
    /// Present while the monitor is running; dropping it tears the watch
    /// down and joins the debounce thread.
    debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
    queue: mpsc::Sender<WorkItem>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
    needs_rescan: Arc<AtomicBool>,
}

struct MonitorInner {
    engine: Arc<RuleEngine>,
    store: Arc<SnapshotStore>,
    config: MonitorConfig,
    ignore: globset::GlobSet,
    events: broadcast::Sender<MonitorEvent>,
    folders: Mutex<HashMap<PathBuf, FolderWatch>>,
    running: AtomicBool,
}

/// Watches folders and dispatches settled files to the rule engine.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

impl Monitor {
    /// Create a monitor. No watches are installed until [`Monitor::start`].
    pub fn new(
        engine: Arc<RuleEngine>,
        store: Arc<SnapshotStore>,
        config: MonitorConfig,
    ) -> Result<Self, MonitorError> {
        let ignore = config.ignore_set()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Ok(Self {
            inner: Arc::new(MonitorInner {
                engine,
                store,
                config,
                ignore,
                events,
                folders: Mutex::new(HashMap::new()),
                running: AtomicBool::new(false),
            }),
        })
    }

    /// Subscribe to outcome and availability notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.events.subscribe()
    }

    /// Whether watches are currently installed.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Paths currently registered with the monitor.
    pub async fn watched_folders(&self) -> Vec<PathBuf> {
        self.inner.folders.lock().await.keys().cloned().collect()
    }

    /// Register a folder and spawn its worker.
    ///
    /// If the monitor is running, the watch is installed immediately;
    /// folders already watched are unaffected either way.
    pub async fn add_folder(&self, path: &Path, recursive: bool) -> Result<(), MonitorError> {
        let mut folders = self.inner.folders.lock().await;
        if folders.contains_key(path) {
            return Err(MonitorError::AlreadyWatching {
                path: path.to_path_buf(),
            });
        }

        let (queue, rx) = mpsc::channel(self.inner.config.queue_capacity);
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(run_worker(
            self.inner.clone(),
            path.to_path_buf(),
            rx,
            cancel.clone(),
        ));
        let mut watch = FolderWatch {
            recursive,
            debouncer: None,
            queue,
            cancel,
            worker,
            needs_rescan: Arc::new(AtomicBool::new(false)),
        };

        if self.is_running() {
            match self.install_watch(path, recursive, &watch) {
                Ok(debouncer) => watch.debouncer = Some(debouncer),
                Err(error) => {
                    let _ = self.inner.events.send(MonitorEvent::FolderUnavailable {
                        path: path.to_path_buf(),
                        reason: error.to_string(),
                    });
                    teardown(watch).await;
                    return Err(error);
                }
            }
        }

        info!(folder = %path.display(), recursive, "folder added");
        folders.insert(path.to_path_buf(), watch);
        Ok(())
    }

    /// Tear down a folder's watch and worker.
    ///
    /// Pending debounce delivery is cancelled race-free and any in-flight
    /// pass is awaited: no action fires for this folder after this
    /// returns.
    pub async fn remove_folder(&self, path: &Path) -> Result<(), MonitorError> {
        let watch = {
            self.inner
                .folders
                .lock()
                .await
                .remove(path)
                .ok_or_else(|| MonitorError::NotWatching {
                    path: path.to_path_buf(),
                })?
        };
        teardown(watch).await;
        info!(folder = %path.display(), "folder removed");
        Ok(())
    }

    /// Install watches for every registered folder.
    ///
    /// A folder whose watch cannot be installed is dropped from
    /// monitoring and surfaced as [`MonitorEvent::FolderUnavailable`];
    /// the others proceed.
    pub async fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut folders = self.inner.folders.lock().await;
        let mut unavailable = Vec::new();
        for (path, watch) in folders.iter_mut() {
            if watch.debouncer.is_some() {
                continue;
            }
            match self.install_watch(path, watch.recursive, watch) {
                Ok(debouncer) => watch.debouncer = Some(debouncer),
                Err(error) => {
                    warn!(folder = %path.display(), %error, "failed to install watch");
                    let _ = self.inner.events.send(MonitorEvent::FolderUnavailable {
                        path: path.clone(),
                        reason: error.to_string(),
                    });
                    unavailable.push(path.clone());
                }
            }
        }
        for path in unavailable {
            if let Some(watch) = folders.remove(&path) {
                teardown(watch).await;
            }
        }
        info!(folders = folders.len(), "monitor started");
    }

    /// Tear down every watch and worker, awaiting in-flight passes.
    pub async fn stop(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        let mut folders = self.inner.folders.lock().await;
        for (_, watch) in folders.drain() {
            teardown(watch).await;
        }
        info!("monitor stopped");
    }

    /// Queue a fallback scan for every registered folder.
    ///
    /// Called on the scheduler tick. A folder whose queue is busy keeps
    /// its rescan flag and is covered by the next tick; one folder never
    /// affects another.
    pub async fn scan_tick(&self) {
        let folders = self.inner.folders.lock().await;
        for (path, watch) in folders.iter() {
            watch.needs_rescan.store(false, Ordering::Relaxed);
            match watch.queue.try_send(WorkItem::Scan) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    watch.needs_rescan.store(true, Ordering::Relaxed);
                    debug!(folder = %path.display(), "queue busy, scan deferred to next tick");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }

    /// Run one pass over a configured folder inline.
    ///
    /// Bypasses the per-folder worker; meant for one-shot passes while
    /// watches are stopped (the CLI's `scan` command).
    pub async fn scan_folder_now(&self, path: &Path) -> Result<Vec<RuleOutcome>, MonitorError> {
        let snapshot = self.inner.store.current();
        let Some(folder) = snapshot.folder(path).cloned() else {
            return Err(MonitorError::NotWatching {
                path: path.to_path_buf(),
            });
        };

        let engine = self.inner.engine.clone();
        let ignore = self.inner.ignore.clone();
        let outcomes = tokio::task::spawn_blocking(move || {
            let candidates = scan::collect_files(&folder.path, folder.recursive, &ignore);
            engine.apply_folder(&folder, &candidates)
        })
        .await;

        match outcomes {
            Ok(outcomes) => {
                self.publish_outcomes(path, &outcomes);
                Ok(outcomes)
            }
            Err(e) => {
                error!(folder = %path.display(), error = %e, "scan pass panicked");
                Ok(Vec::new())
            }
        }
    }

    fn publish_outcomes(&self, folder: &Path, outcomes: &[RuleOutcome]) {
        if outcomes.is_empty() {
            return;
        }
        let _ = self.inner.events.send(MonitorEvent::Outcomes {
            folder: folder.to_path_buf(),
            outcomes: outcomes.iter().map(OutcomeReport::from).collect(),
        });
    }

    /// Build the debounced watch feeding a folder's queue.
    fn install_watch(
        &self,
        path: &Path,
        recursive: bool,
        watch: &FolderWatch,
    ) -> Result<Debouncer<RecommendedWatcher, RecommendedCache>, MonitorError> {
        let queue = watch.queue.clone();
        let needs_rescan = watch.needs_rescan.clone();
        let ignore = self.inner.ignore.clone();
        let folder = path.to_path_buf();

        let mut debouncer = new_debouncer(
            self.inner.config.debounce(),
            None,
            move |result: Result<Vec<DebouncedEvent>, Vec<notify::Error>>| match result {
                Ok(events) => {
                    let mut settled: Vec<PathBuf> = Vec::new();
                    for event in &events {
                        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                            continue;
                        }
                        for event_path in &event.paths {
                            if event_path.is_dir() || scan::is_ignored(&ignore, event_path) {
                                continue;
                            }
                            if !settled.contains(event_path) {
                                settled.push(event_path.clone());
                            }
                        }
                    }
                    if settled.is_empty() {
                        return;
                    }
                    match queue.try_send(WorkItem::Settled(settled)) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            // Events queue up to capacity; overflow falls
                            // back to the next full rescan.
                            needs_rescan.store(true, Ordering::Relaxed);
                            warn!(
                                folder = %folder.display(),
                                "work queue full, deferring to the next scan"
                            );
                        }
                        Err(TrySendError::Closed(_)) => {}
                    }
                }
                Err(errors) => {
                    for error in errors {
                        warn!(folder = %folder.display(), %error, "watch error");
                    }
                }
            },
        )
        .map_err(|e| MonitorError::FolderUnavailable {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        debouncer
            .watch(path, mode)
            .map_err(|e| MonitorError::FolderUnavailable {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(debouncer)
    }
}

/// Stop a folder's watch and worker, awaiting any in-flight pass.
async fn teardown(mut watch: FolderWatch) {
    // Dropping the debouncer joins its thread; no settled batch can be
    // delivered afterwards.
    watch.debouncer.take();
    watch.cancel.cancel();
    if let Err(e) = watch.worker.await {
        if !e.is_cancelled() {
            error!(error = %e, "folder worker ended abnormally");
        }
    }
}

/// The per-folder worker: serializes rule application for its folder.
async fn run_worker(
    inner: Arc<MonitorInner>,
    folder: PathBuf,
    mut rx: mpsc::Receiver<WorkItem>,
    cancel: CancellationToken,
) {
    debug!(folder = %folder.display(), "worker started");
    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            item = rx.recv() => match item {
                Some(item) => item,
                None => break,
            },
        };

        // One snapshot per batch: rules cannot flip mid-pass.
        let snapshot = inner.store.current();
        let Some(folder_config) = snapshot.folder(&folder).cloned() else {
            debug!(folder = %folder.display(), "folder absent from snapshot, batch dropped");
            continue;
        };

        let engine = inner.engine.clone();
        let ignore = inner.ignore.clone();
        let batch = tokio::task::spawn_blocking(move || {
            let candidates = match item {
                WorkItem::Settled(paths) => paths,
                WorkItem::Scan => {
                    scan::collect_files(&folder_config.path, folder_config.recursive, &ignore)
                }
            };
            engine.apply_folder(&folder_config, &candidates)
        })
        .await;

        match batch {
            Ok(outcomes) => {
                if outcomes.is_empty() {
                    continue;
                }
                let _ = inner.events.send(MonitorEvent::Outcomes {
                    folder: folder.clone(),
                    outcomes: outcomes.iter().map(OutcomeReport::from).collect(),
                });
            }
            Err(e) => error!(folder = %folder.display(), error = %e, "folder pass panicked"),
        }
    }
    debug!(folder = %folder.display(), "worker stopped");
}
