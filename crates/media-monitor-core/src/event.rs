use crate::catalog::{MediaRecord, Probed};
use crate::path::join_relative;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    NotProcessing,
    New,
    Missing,
    Renamed,
    Updated,
    Duplicate,
    /// Reserved.
    Similar,
    BadHash,
    /// Reserved.
    FoundBetter,
    BrokenStructure,
}

impl Action {
    /// Raw actions that trigger content inspection during classification.
    pub fn needs_reconciliation(self) -> bool {
        matches!(
            self,
            Action::Missing | Action::New | Action::Renamed | Action::Updated
        )
    }
}

/// Action-dependent payload of an `Event`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EventInfo {
    #[default]
    None,
    /// Content hash observed on disk (NEW, UPDATED).
    Hash(Probed<String>),
    /// Cataloged records involved (DUPLICATE, BAD_HASH).
    Records(Vec<MediaRecord>),
    /// New `(file, dir)` after a rename.
    Target { file: String, dir: String },
}

/// A classified observation, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub action: Action,
    pub file_name: String,
    pub directory: String,
    pub is_dir: bool,
    pub watch_root: PathBuf,
    pub info: EventInfo,
    pub is_in_catalog: bool,
}

impl Event {
    pub fn new(
        file_name: impl Into<String>,
        directory: impl Into<String>,
        is_dir: bool,
        watch_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            action: Action::NotProcessing,
            file_name: file_name.into(),
            directory: directory.into(),
            is_dir,
            watch_root: watch_root.into(),
            info: EventInfo::None,
            is_in_catalog: false,
        }
    }

    /// Absolute path the event refers to.
    pub fn path(&self) -> PathBuf {
        join_relative(&self.watch_root, &self.directory, &self.file_name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} (is_dir: {}, in catalog: {})",
            self.action,
            self.path().display(),
            self.is_dir,
            self.is_in_catalog
        )?;
        match &self.info {
            EventInfo::None => Ok(()),
            EventInfo::Hash(hash) => write!(f, " hash={}", hash),
            EventInfo::Records(records) => write!(f, " records={}", records.len()),
            EventInfo::Target { file, dir } => write!(f, " -> {}/{}", dir, file),
        }
    }
}
