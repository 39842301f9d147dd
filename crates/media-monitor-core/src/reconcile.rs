use crate::classifier::Observation;
use crate::error::Error;
use crate::event::Action;
use crate::probe::Filesystem;
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Walk `root/*` and `root/*/*` and turn every entry into a rescan
/// observation. The catalog supports a single level of subdirectories, so
/// a directory found at the second level is `BrokenStructure`.
pub fn collect_observations(root: &Path, fs: &dyn Filesystem) -> Result<Vec<Observation>, Error> {
    let mut observations = Vec::new();

    for first in list_entries(root)? {
        if !fs.is_dir(&first) {
            observations.push(Observation::new(first, Action::New));
            continue;
        }
        for second in list_entries(&first)? {
            let action = if fs.is_dir(&second) {
                Action::BrokenStructure
            } else {
                Action::New
            };
            observations.push(Observation::new(second, action));
        }
    }

    debug!(
        "Collected {} rescan observations under {}",
        observations.len(),
        root.display()
    );
    Ok(observations)
}

/// Sorted non-hidden entries of `dir`. Unreadable entries are logged and skipped.
fn list_entries(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let escaped = Pattern::escape(&dir.to_string_lossy());
    let pattern = Path::new(&escaped).join("*");

    let paths = glob::glob_with(&pattern.to_string_lossy(), options)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

    let mut entries: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                error!("Error reading entry {}: {}", err.path().display(), err);
                None
            }
        })
        .collect();
    entries.sort();
    Ok(entries)
}
