//! Hot reload of the settings file
//!
//! Watches the directory holding the settings file (writers replace the file
//! by rename, which a watch on the file itself would miss) and republishes
//! the stored public routes whenever the file changes. A failed reload keeps
//! the current snapshot.

use crate::error::{Result, RouteGateError};
use crate::settings::SettingsService;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Reload event sent after each reload attempt
#[derive(Debug, Clone)]
pub struct ReloadEvent {
    /// Path that triggered the reload
    pub path: PathBuf,
    /// Result of the reload
    pub result: ReloadResult,
    /// Timestamp of the reload
    pub timestamp: Instant,
}

/// Result of a reload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadResult {
    /// Reload succeeded with this many public routes
    Success(usize),
    /// Reload failed (old routes retained)
    Failed(String),
}

/// Watches a settings file and republishes it on change
pub struct SettingsWatcher {
    service: Arc<SettingsService>,
    path: PathBuf,
    poll_interval: Duration,
}

impl SettingsWatcher {
    /// Create a watcher for the settings file at `path`
    pub fn new(service: Arc<SettingsService>, path: impl Into<PathBuf>) -> Self {
        SettingsWatcher {
            service,
            path: path.into(),
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Poll interval for platforms without native notifications
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Manually trigger a reload
    pub fn reload(&self) -> ReloadResult {
        reload_settings(&self.service, &self.path)
    }

    /// Start watching in the background.
    ///
    /// Watching stops when the returned handle is dropped.
    pub fn start(self) -> Result<WatchHandle> {
        let dir = watch_dir(&self.path)?;
        let (tx, rx) = channel();
        let service = self.service.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => handle_event(&service, &path, event, &tx),
                Err(e) => error!("Settings watch error: {}", e),
            },
            Config::default()
                .with_poll_interval(self.poll_interval)
                .with_compare_contents(false),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(path = ?self.path, "Watching settings file");

        Ok(WatchHandle {
            _watcher: watcher,
            events: rx,
        })
    }
}

/// Keeps the background watch alive
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    events: Receiver<ReloadEvent>,
}

impl WatchHandle {
    /// Try to receive a reload event (non-blocking)
    pub fn try_recv(&self) -> Option<ReloadEvent> {
        self.events.try_recv().ok()
    }

    /// Receive with timeout
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ReloadEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Drain events on a background thread, calling `f` for each one.
    ///
    /// The thread owns the handle, so watching continues for as long as the
    /// thread runs.
    pub fn drain_with<F>(self, mut f: F) -> std::io::Result<std::thread::JoinHandle<()>>
    where
        F: FnMut(ReloadEvent) + Send + 'static,
    {
        std::thread::Builder::new()
            .name("settings-reload".to_string())
            .spawn(move || {
                while let Ok(event) = self.events.recv() {
                    f(event);
                }
            })
    }
}

fn watch_dir(path: &Path) -> Result<PathBuf> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !dir.is_dir() {
        return Err(RouteGateError::ConfigError(format!(
            "Settings directory does not exist: {:?}",
            dir
        )));
    }
    Ok(dir)
}

fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Name(_))
        | EventKind::Modify(ModifyKind::Any) => true,
        _ => false,
    }
}

fn handle_event(service: &SettingsService, path: &Path, event: Event, tx: &Sender<ReloadEvent>) {
    if !is_relevant(&event.kind) {
        return;
    }

    let file_name = path.file_name();
    if !event.paths.iter().any(|p| p.file_name() == file_name) {
        return;
    }

    debug!(kind = ?event.kind, "Settings file changed");
    let result = reload_settings(service, path);

    let event = ReloadEvent {
        path: path.to_path_buf(),
        result,
        timestamp: Instant::now(),
    };
    if tx.send(event).is_err() {
        debug!("Reload event dropped (no subscriber)");
    }
}

fn reload_settings(service: &SettingsService, path: &Path) -> ReloadResult {
    match service.load_into_engine() {
        Ok(routes) => {
            info!(path = ?path, public_routes = routes.len(), "Reloaded settings");
            ReloadResult::Success(routes.len())
        }
        Err(e) => {
            warn!(path = ?path, "Failed to reload settings: {}. Keeping current public routes.", e);
            ReloadResult::Failed(e.to_string())
        }
    }
}
