pub mod catalog;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event;
pub mod path;
pub mod probe;
pub mod progress;
pub mod reconcile;
pub mod watcher;
pub mod worker;

pub use catalog::{Catalog, MatchFlags, MediaDraft, MediaRecord, Patch, Pattern, Probed, SharedCatalog};
pub use config::AppConfig;
pub use engine::{ApprovalGate, Engine, RescanSummary};
pub use error::Error;
pub use event::{Action, Event, EventInfo};
pub use probe::{Filesystem, LocalFilesystem};
pub use progress::{ReconcileReporter, SilentReporter};
pub use watcher::{DirectoryWatcher, Notification, NotificationSink};
pub use worker::{Task, TaskQueue};
