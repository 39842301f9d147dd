use crate::catalog::SharedCatalog;
use crate::classifier::{self, Observation};
use crate::config::AppConfig;
use crate::dispatcher::{approve_all, Dispatcher};
use crate::error::Error;
use crate::event::{Action, Event};
use crate::probe::Filesystem;
use crate::progress::ReconcileReporter;
use crate::reconcile;
use crate::watcher::{Notification, NotificationSink};
use dashmap::DashSet;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub use crate::dispatcher::ApprovalGate;

/// Reconciles filesystem observations against the catalog.
pub struct Engine {
    config: AppConfig,
    watch_root: PathBuf,
    catalog: SharedCatalog,
    fs: Arc<dyn Filesystem>,
    gate: ApprovalGate,
    suppressed: DashSet<PathBuf>,
}

#[derive(Debug)]
pub struct RescanSummary {
    pub observed: usize,
    pub applied: usize,
    pub actions: BTreeMap<Action, usize>,
    pub duration: Duration,
}

impl Engine {
    /// Resolves the configured watch root to its canonical path and binds
    /// an unrooted catalog to it. Notification paths are absolute, so a
    /// relative or symlinked root would never match them.
    pub fn new(
        config: AppConfig,
        catalog: SharedCatalog,
        fs: Arc<dyn Filesystem>,
    ) -> Result<Self, Error> {
        let watch_root = fs.canonicalize(&config.watch_root()?)?;
        catalog.write(|c| {
            if !c.has_root() {
                info!("Binding catalog to watch root {}", watch_root.display());
                c.set_root_dir(watch_root.to_string_lossy());
            }
        })?;

        Ok(Self {
            config,
            watch_root,
            catalog,
            fs,
            gate: approve_all(),
            suppressed: DashSet::new(),
        })
    }

    pub fn with_gate(mut self, gate: ApprovalGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub fn is_suppressed(&self, path: &Path) -> bool {
        self.suppressed.contains(path)
    }

    pub fn prepare_event(&self, observation: &Observation) -> Result<Event, Error> {
        classifier::prepare_event(&self.catalog, self.fs.as_ref(), &self.watch_root, observation)
    }

    pub fn process_event(&self, event: &Event) -> Result<bool, Error> {
        Dispatcher {
            catalog: &self.catalog,
            fs: self.fs.as_ref(),
            gate: &self.gate,
            suppressed: &self.suppressed,
        }
        .process_event(event)
    }

    /// Classify and dispatch one notification. Returns `None` when the
    /// notification was skipped before classification.
    pub fn handle_notification(&self, notification: &Notification) -> Result<Option<Event>, Error> {
        let source = notification.source();

        if self.suppressed.remove(source).is_some() {
            debug!("Ignoring self-inflicted notification for {}", source.display());
            return Ok(None);
        }

        let action = notification.raw_action();
        if action != Action::Renamed && self.fs.is_dir(source) {
            debug!("Ignoring directory notification {:?}", notification);
            return Ok(None);
        }

        let observation = Observation {
            path: source.to_path_buf(),
            action,
            rename_target: notification.target().map(Path::to_path_buf),
        };
        let event = self.prepare_event(&observation)?;
        self.process_event(&event)?;
        Ok(Some(event))
    }

    /// Full two-level rescan of the watch root through classify and dispatch.
    pub fn rescan(&self, reporter: &dyn ReconcileReporter) -> Result<RescanSummary, Error> {
        let start = Instant::now();
        let observations = reconcile::collect_observations(&self.watch_root, self.fs.as_ref())?;
        reporter.on_rescan_start(observations.len());

        let mut actions = BTreeMap::new();
        let mut applied = 0;
        for (processed, observation) in observations.iter().enumerate() {
            let event = self.prepare_event(observation)?;
            if self.process_event(&event)? {
                applied += 1;
            }
            *actions.entry(event.action).or_insert(0) += 1;
            reporter.on_rescan_progress(processed + 1, &event);
        }

        let duration = start.elapsed();
        reporter.on_rescan_complete(observations.len(), duration.as_secs_f64());
        info!(
            "Rescan of {} completed in {:.2}s: {} entries, {} applied",
            self.watch_root.display(),
            duration.as_secs_f64(),
            observations.len(),
            applied
        );

        Ok(RescanSummary {
            observed: observations.len(),
            applied,
            actions,
            duration,
        })
    }
}

impl NotificationSink for Engine {
    fn on_notification(&self, notification: Notification) {
        if let Err(e) = self.handle_notification(&notification) {
            error!("Failed to reconcile {:?}: {}", notification, e);
        }
    }
}
