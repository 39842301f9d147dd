mod pattern;
mod record;
mod shared;
pub mod snapshot;

pub use pattern::{MatchFlags, Pattern};
pub use record::{MediaDraft, MediaRecord, Patch, Probed, DEFAULT_TAG};
pub use shared::SharedCatalog;

use crate::error::Error;
use crate::path::join_relative;
use crate::probe::Filesystem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// Root marker of a catalog that was never bound to a directory.
pub const UNSET_ROOT: &str = "<unset>";

/// Media records plus the tag reference-count index.
///
/// A tag is present in the index iff at least one record carries it, and
/// its count equals the number of such records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    root_dir: String,
    tags: BTreeMap<String, u64>,
    media: Vec<MediaRecord>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            root_dir: UNSET_ROOT.to_string(),
            tags: BTreeMap::new(),
            media: Vec::new(),
        }
    }

    pub fn with_root(root_dir: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::empty()
        }
    }

    /// Rebuild a catalog from raw records, recomputing the tag index.
    /// No per-path uniqueness check is made here.
    pub fn from_records(root_dir: impl Into<String>, media: Vec<MediaRecord>) -> Self {
        let mut tags = BTreeMap::new();
        for record in &media {
            for tag in &record.tags {
                *tags.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        Self {
            root_dir: root_dir.into(),
            tags,
            media,
        }
    }

    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    pub fn set_root_dir(&mut self, root_dir: impl Into<String>) {
        self.root_dir = root_dir.into();
    }

    pub fn has_root(&self) -> bool {
        self.root_dir != UNSET_ROOT
    }

    pub fn records(&self) -> &[MediaRecord] {
        &self.media
    }

    pub fn tags(&self) -> &BTreeMap<String, u64> {
        &self.tags
    }

    pub fn tag_count(&self, tag: &str) -> Option<u64> {
        self.tags.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    /// All records matching `pattern`, in insertion order.
    pub fn find(&self, pattern: &Pattern, flags: MatchFlags) -> Result<Vec<MediaRecord>, Error> {
        let compiled = pattern.compile(flags)?;
        Ok(self
            .media
            .iter()
            .filter(|record| compiled.matches(record))
            .cloned()
            .collect())
    }

    fn matching_indices(&self, pattern: &Pattern, flags: MatchFlags) -> Result<Vec<usize>, Error> {
        let compiled = pattern.compile(flags)?;
        Ok(self
            .media
            .iter()
            .enumerate()
            .filter(|(_, record)| compiled.matches(record))
            .map(|(index, _)| index)
            .collect())
    }

    /// Append a record, probing any of size/created/hash that the draft
    /// leaves out. Probes that fail store `Unknown`.
    pub fn add(&mut self, draft: MediaDraft, fs: &dyn Filesystem) -> Result<(), Error> {
        let file = match draft.file {
            Some(file) if !file.is_empty() => file,
            _ => return Err(Error::MissingField("file")),
        };
        let dir = draft.dir.unwrap_or_default();

        let existing = self.find(&Pattern::path(file.as_str(), dir.as_str()), MatchFlags::exact())?;
        if !existing.is_empty() {
            return Err(Error::Integrity {
                file,
                dir,
                count: existing.len() + 1,
            });
        }

        let path = join_relative(Path::new(&self.root_dir), &dir, &file);
        let size = draft.size.unwrap_or_else(|| fs.size(&path));
        let created = draft.created.unwrap_or_else(|| fs.created(&path));
        let hash = draft.hash.unwrap_or_else(|| fs.content_hash(&path));
        let tags = match draft.tags {
            Some(tags) if !tags.is_empty() => tags,
            _ => BTreeSet::from([DEFAULT_TAG.to_string()]),
        };

        for tag in &tags {
            *self.tags.entry(tag.clone()).or_insert(0) += 1;
        }

        let record = MediaRecord {
            file,
            dir,
            size,
            created,
            hash,
            tags,
            url: draft.url.unwrap_or_default(),
            google: draft.google.unwrap_or_default(),
        };
        debug!("Catalog add: {}", record);
        self.media.push(record);
        Ok(())
    }

    /// Remove every record matching `pattern`, releasing its tags.
    pub fn remove(
        &mut self,
        pattern: &Pattern,
        flags: MatchFlags,
    ) -> Result<Vec<MediaRecord>, Error> {
        let indices = self.matching_indices(pattern, flags)?;
        let mut removed = Vec::with_capacity(indices.len());

        // Highest index first so earlier indices stay valid.
        for index in indices.into_iter().rev() {
            let record = self.media.remove(index);
            for tag in &record.tags {
                self.release_tag(tag);
            }
            debug!("Catalog remove: {}", record);
            removed.push(record);
        }
        removed.reverse();
        Ok(removed)
    }

    fn release_tag(&mut self, tag: &str) {
        if let Some(count) = self.tags.get_mut(tag) {
            *count -= 1;
            if *count == 0 {
                self.tags.remove(tag);
            }
        }
    }

    /// Merge `patch` into every record matching `search`. The search must
    /// name a file; a missing dir means the catalog root level.
    pub fn update(
        &mut self,
        search: &Pattern,
        patch: &Patch,
        flags: MatchFlags,
    ) -> Result<usize, Error> {
        if search.file.is_none() {
            return Err(Error::MissingField("file"));
        }
        let mut search = search.clone();
        search.dir.get_or_insert_with(String::new);

        let indices = self.matching_indices(&search, flags)?;
        for &index in &indices {
            patch.apply(&mut self.media[index]);
        }
        debug!(
            "Catalog update: {} record(s) in {:?} with {:?}",
            indices.len(),
            search,
            patch
        );
        Ok(indices.len())
    }

    /// Re-home every record of directory `from` under `to`.
    pub fn move_dir(&mut self, from: &str, to: &str) -> usize {
        let mut moved = 0;
        for record in self.media.iter_mut().filter(|record| record.dir == from) {
            record.dir = to.to_string();
            moved += 1;
        }
        debug!("Catalog move dir: '{}' -> '{}' ({} records)", from, to, moved);
        moved
    }
}
