//! Bridge between `notify` and the engine.
//!
//! The OS notification backend is reduced to four notification kinds,
//! which the engine maps to raw classifier actions.

use crate::error::Error;
use crate::event::Action;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Created(PathBuf),
    Deleted(PathBuf),
    Moved { from: PathBuf, to: PathBuf },
    Modified(PathBuf),
}

impl Notification {
    pub fn raw_action(&self) -> Action {
        match self {
            Notification::Created(_) => Action::New,
            Notification::Deleted(_) => Action::Missing,
            Notification::Moved { .. } => Action::Renamed,
            Notification::Modified(_) => Action::Updated,
        }
    }

    pub fn source(&self) -> &Path {
        match self {
            Notification::Created(path)
            | Notification::Deleted(path)
            | Notification::Modified(path) => path.as_path(),
            Notification::Moved { from, .. } => from.as_path(),
        }
    }

    pub fn target(&self) -> Option<&Path> {
        match self {
            Notification::Moved { to, .. } => Some(to.as_path()),
            _ => None,
        }
    }
}

/// The one capability the engine offers to a notification source.
pub trait NotificationSink: Send + Sync {
    fn on_notification(&self, notification: Notification);
}

/// How long a rename source waits for its target before it is reported
/// as a deletion.
pub const RENAME_PAIR_WINDOW: Duration = Duration::from_millis(100);
const SETTLED_CAPACITY: usize = 64;

/// Folds the backend's rename halves into single `Moved` notifications.
///
/// On Linux a rename arrives as `Name(From)`, `Name(To)` and `Name(Both)`,
/// all carrying the same tracker cookie. A `From` is held until its `To`
/// arrives; the pair becomes one `Moved` and the trailing `Both` is dropped.
/// A `From` that is never paired (moved out of the tree) is released as
/// `Deleted` once another event arrives or the pair window expires. A lone
/// `To` (moved into the tree) is a `Created`.
#[derive(Debug, Default)]
pub struct RenameTracker {
    pending: Vec<PendingFrom>,
    settled: VecDeque<usize>,
}

#[derive(Debug)]
struct PendingFrom {
    cookie: usize,
    path: PathBuf,
    seen: Instant,
}

impl RenameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Reduce a `notify` event to zero or more notifications.
    pub fn translate(&mut self, event: NotifyEvent, now: Instant) -> Vec<Notification> {
        let cookie = event.attrs.tracker();

        match event.kind {
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                let mut out = self.release_except(cookie);
                match cookie {
                    Some(cookie) => self.pending.extend(event.paths.into_iter().map(|path| {
                        PendingFrom {
                            cookie,
                            path,
                            seen: now,
                        }
                    })),
                    None => out.extend(event.paths.into_iter().map(Notification::Deleted)),
                }
                out
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                if let Some(cookie) = cookie {
                    if self.is_settled(cookie) {
                        return Vec::new();
                    }
                    if let Some(from) = self.take_pending(cookie) {
                        let mut out = self.release_except(Some(cookie));
                        if let Some(to) = event.paths.into_iter().next() {
                            self.settle(cookie);
                            out.push(Notification::Moved { from, to });
                        } else {
                            out.push(Notification::Deleted(from));
                        }
                        return out;
                    }
                }
                let mut out = self.release_except(cookie);
                out.extend(event.paths.into_iter().map(Notification::Created));
                out
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let Some(cookie) = cookie {
                    if self.is_settled(cookie) {
                        return Vec::new();
                    }
                    self.take_pending(cookie);
                }
                let mut out = self.release_except(cookie);
                let mut paths = event.paths.into_iter();
                if let (Some(from), Some(to)) = (paths.next(), paths.next()) {
                    if let Some(cookie) = cookie {
                        self.settle(cookie);
                    }
                    out.push(Notification::Moved { from, to });
                }
                out
            }
            kind => {
                let mut out = self.release_except(None);
                out.extend(simple_notifications(kind, event.paths));
                out
            }
        }
    }

    /// Release rename sources older than the pair window as deletions.
    pub fn expire(&mut self, now: Instant) -> Vec<Notification> {
        let (expired, kept): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| now.duration_since(p.seen) >= RENAME_PAIR_WINDOW);
        self.pending = kept;
        expired
            .into_iter()
            .map(|p| Notification::Deleted(p.path))
            .collect()
    }

    /// Release every held rename source as a deletion.
    pub fn flush(&mut self) -> Vec<Notification> {
        self.pending
            .drain(..)
            .map(|p| Notification::Deleted(p.path))
            .collect()
    }

    fn release_except(&mut self, cookie: Option<usize>) -> Vec<Notification> {
        let (kept, released): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| Some(p.cookie) == cookie);
        self.pending = kept;
        released
            .into_iter()
            .map(|p| Notification::Deleted(p.path))
            .collect()
    }

    fn take_pending(&mut self, cookie: usize) -> Option<PathBuf> {
        let index = self.pending.iter().position(|p| p.cookie == cookie)?;
        Some(self.pending.remove(index).path)
    }

    fn is_settled(&self, cookie: usize) -> bool {
        self.settled.contains(&cookie)
    }

    fn settle(&mut self, cookie: usize) {
        if self.settled.len() == SETTLED_CAPACITY {
            self.settled.pop_front();
        }
        self.settled.push_back(cookie);
    }
}

fn simple_notifications(kind: EventKind, paths: Vec<PathBuf>) -> Vec<Notification> {
    match kind {
        EventKind::Create(_) => paths.into_iter().map(Notification::Created).collect(),
        EventKind::Remove(_) => paths.into_iter().map(Notification::Deleted).collect(),
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            paths.into_iter().map(Notification::Modified).collect()
        }
        _ => Vec::new(),
    }
}

/// Recursive watch over the watch root, feeding a `NotificationSink` from a
/// dedicated `watch-events` thread. Watching stops when this value is
/// dropped; held rename sources are released before the thread exits.
pub struct DirectoryWatcher {
    watcher: Option<RecommendedWatcher>,
    events: Option<JoinHandle<()>>,
}

impl DirectoryWatcher {
    pub fn start(root: &Path, sink: Arc<dyn NotificationSink>) -> Result<Self, Error> {
        let (tx, rx) = mpsc::channel::<notify::Result<NotifyEvent>>();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        let events = thread::Builder::new()
            .name("watch-events".to_string())
            .spawn(move || deliver_events(rx, sink.as_ref()))?;

        info!("Watching {} (recursive)", root.display());
        Ok(Self {
            watcher: Some(watcher),
            events: Some(events),
        })
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        // Dropping the backend closes the channel and ends the event thread.
        drop(self.watcher.take());
        if let Some(events) = self.events.take() {
            if events.join().is_err() {
                error!("Watch event thread panicked");
            }
        }
    }
}

fn deliver_events(rx: Receiver<notify::Result<NotifyEvent>>, sink: &dyn NotificationSink) {
    let mut tracker = RenameTracker::new();
    loop {
        let notifications = match rx.recv_timeout(RENAME_PAIR_WINDOW) {
            Ok(Ok(event)) => {
                trace!("Raw watch event: {:?}", event);
                tracker.translate(event, Instant::now())
            }
            Ok(Err(e)) => {
                error!("Watch error: {:?}", e);
                continue;
            }
            Err(RecvTimeoutError::Timeout) => tracker.expire(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => {
                for notification in tracker.flush() {
                    sink.on_notification(notification);
                }
                debug!("Watch event channel closed");
                return;
            }
        };
        for notification in notifications {
            sink.on_notification(notification);
        }
    }
}
