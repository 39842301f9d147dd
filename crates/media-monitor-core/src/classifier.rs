use crate::catalog::{MatchFlags, MediaRecord, Pattern, Probed, SharedCatalog};
use crate::error::Error;
use crate::event::{Action, Event, EventInfo};
use crate::path::split_file_and_dir;
use crate::probe::Filesystem;
use std::path::{Path, PathBuf};
use tracing::trace;

/// One raw filesystem observation, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub path: PathBuf,
    pub action: Action,
    pub rename_target: Option<PathBuf>,
}

impl Observation {
    pub fn new(path: impl Into<PathBuf>, action: Action) -> Self {
        Self {
            path: path.into(),
            action,
            rename_target: None,
        }
    }

    pub fn renamed(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            path: from.into(),
            action: Action::Renamed,
            rename_target: Some(to.into()),
        }
    }
}

/// Classify `observation` against the catalog. Reads the catalog and the
/// filesystem, mutates neither.
pub fn prepare_event(
    catalog: &SharedCatalog,
    fs: &dyn Filesystem,
    watch_root: &Path,
    observation: &Observation,
) -> Result<Event, Error> {
    let path = observation.path.as_path();
    let raw = observation.action;

    // A moved-away directory no longer exists at its source path.
    let is_dir = fs.is_dir(path)
        || (raw == Action::Renamed
            && observation
                .rename_target
                .as_deref()
                .is_some_and(|target| fs.is_dir(target)));

    let (file_name, directory) = split_file_and_dir(path, watch_root, is_dir)?;
    let existing = catalog.find(
        &Pattern::path(file_name.as_str(), directory.as_str()),
        MatchFlags::exact(),
    )?;

    let mut event = Event::new(file_name, directory, is_dir, watch_root);
    event.is_in_catalog = !existing.is_empty() || raw == Action::Renamed;

    if is_dir || !raw.needs_reconciliation() {
        event.action = raw;
        if is_dir && raw == Action::Renamed {
            let (file, dir) = rename_target(observation, watch_root, true)?;
            event.info = EventInfo::Target { file, dir };
        }
        trace!("Pass-through event: {}", event);
        return Ok(event);
    }

    if existing.len() > 1 {
        return Err(Error::Integrity {
            file: event.file_name,
            dir: event.directory,
            count: existing.len(),
        });
    }

    // After a move the content lives at the target.
    let probe_path = match (raw, observation.rename_target.as_deref()) {
        (Action::Renamed, Some(target)) => target,
        _ => path,
    };

    if !fs.exists(probe_path) {
        if !existing.is_empty() {
            event.action = Action::Missing;
        }
        return Ok(event);
    }

    let current_hash = fs.content_hash(probe_path);
    let target = match (raw, observation.rename_target.as_deref()) {
        (Action::Renamed, Some(target)) => Some(split_file_and_dir(target, watch_root, false)?),
        _ => None,
    };
    let at_target = |record: &MediaRecord| {
        target
            .as_ref()
            .is_some_and(|(file, dir)| record.file == *file && record.dir == *dir)
    };

    let by_hash: Vec<MediaRecord> = match &current_hash {
        Probed::Known(_) => catalog
            .find(
                &Pattern::new().hash(current_hash.clone()),
                MatchFlags::exact(),
            )?
            .into_iter()
            .filter(|record| !at_target(record))
            .collect(),
        Probed::Unknown => Vec::new(),
    };
    let existing_target = match &target {
        Some((file, dir)) if existing.is_empty() => catalog.find(
            &Pattern::path(file.as_str(), dir.as_str()),
            MatchFlags::exact(),
        )?,
        _ => Vec::new(),
    };

    if let Some(stored) = existing.first() {
        if stored.hash != current_hash {
            if raw == Action::Updated {
                event.action = Action::Updated;
                event.info = EventInfo::Hash(current_hash);
            } else {
                event.action = Action::BadHash;
                event.info = EventInfo::Records(existing);
            }
        } else if raw == Action::Renamed {
            let (file, dir) = rename_target(observation, watch_root, false)?;
            event.action = Action::Renamed;
            event.info = EventInfo::Target { file, dir };
        }
    } else if let Some(stored) = existing_target.first() {
        // Moved onto a path the catalog already tracks.
        adopt_target(&mut event, target);
        if stored.hash != current_hash {
            event.action = Action::BadHash;
            event.info = EventInfo::Records(existing_target);
        }
    } else if !by_hash.is_empty() {
        event.action = Action::Duplicate;
        event.is_in_catalog = true;
        event.info = EventInfo::Records(by_hash);
        adopt_target(&mut event, target);
    } else {
        event.action = Action::New;
        if raw == Action::Renamed {
            let (file, dir) = rename_target(observation, watch_root, false)?;
            event.file_name = file;
            event.directory = dir;
        }
        event.info = EventInfo::Hash(current_hash);
    }

    Ok(event)
}

/// A classified rename describes the file at its new location.
fn adopt_target(event: &mut Event, target: Option<(String, String)>) {
    if let Some((file, dir)) = target {
        event.file_name = file;
        event.directory = dir;
    }
}

fn rename_target(
    observation: &Observation,
    watch_root: &Path,
    is_dir: bool,
) -> Result<(String, String), Error> {
    let target = observation
        .rename_target
        .as_deref()
        .ok_or_else(|| Error::MissingRenameTarget(observation.path.clone()))?;
    split_file_and_dir(target, watch_root, is_dir)
}
