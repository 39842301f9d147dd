use crate::catalog::{MatchFlags, MediaDraft, Patch, Pattern, Probed, SharedCatalog};
use crate::error::Error;
use crate::event::{Action, Event, EventInfo};
use crate::probe::Filesystem;
use dashmap::DashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Caller-supplied veto over every classified event. Returning `false`
/// leaves the catalog and the filesystem untouched.
pub type ApprovalGate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Gate that approves everything.
pub fn approve_all() -> ApprovalGate {
    Arc::new(|_: &Event| true)
}

/// Applies the side effects implied by a classified event.
pub struct Dispatcher<'a> {
    pub catalog: &'a SharedCatalog,
    pub fs: &'a dyn Filesystem,
    pub gate: &'a ApprovalGate,
    /// Paths whose next notification is self-inflicted and must be ignored.
    pub suppressed: &'a DashSet<PathBuf>,
}

impl Dispatcher<'_> {
    /// Returns whether a side effect was applied.
    pub fn process_event(&self, event: &Event) -> Result<bool, Error> {
        if event.action == Action::NotProcessing {
            return Ok(false);
        }
        if !(self.gate)(event) {
            debug!("Event rejected by approval gate: {}", event);
            return Ok(false);
        }
        info!("{}", event);

        match event.action {
            Action::New => {
                let mut draft =
                    MediaDraft::new(event.file_name.as_str()).dir(event.directory.as_str());
                // An unknown hash is probed again on insert.
                if let EventInfo::Hash(hash @ Probed::Known(_)) = &event.info {
                    draft = draft.hash(hash.clone());
                }
                self.catalog.add(draft, self.fs)?;
            }
            Action::Missing => {
                self.catalog
                    .remove(&self.path_pattern(event), MatchFlags::exact())?;
            }
            Action::Duplicate => {
                let path = event.path();
                self.suppressed.insert(path.clone());
                if let Err(e) = self.fs.remove_file(&path) {
                    self.suppressed.remove(&path);
                    return Err(e.into());
                }
                info!("Deleted duplicate {}", path.display());
            }
            Action::Updated => {
                let hash = match &event.info {
                    EventInfo::Hash(hash) => hash.clone(),
                    _ => Probed::Unknown,
                };
                self.catalog.update(
                    &self.path_pattern(event),
                    &Patch::new().hash(hash),
                    MatchFlags::exact(),
                )?;
            }
            Action::Renamed => {
                let EventInfo::Target { file, dir } = &event.info else {
                    warn!("Rename event without target: {}", event);
                    return Ok(false);
                };
                if event.is_dir {
                    self.catalog.move_dir(&event.directory, dir)?;
                } else {
                    self.catalog.update(
                        &self.path_pattern(event),
                        &Patch::new().file(file.as_str()).dir(dir.as_str()),
                        MatchFlags::exact(),
                    )?;
                }
            }
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn path_pattern(&self, event: &Event) -> Pattern {
        Pattern::path(event.file_name.as_str(), event.directory.as_str())
    }
}
