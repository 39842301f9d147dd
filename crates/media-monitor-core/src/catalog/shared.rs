use super::{Catalog, MatchFlags, MediaDraft, MediaRecord, Patch, Pattern};
use crate::error::Error;
use crate::probe::Filesystem;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// The single serialization point for catalog access. Every operation
/// holds the lock for exactly its own duration.
#[derive(Debug, Clone, Default)]
pub struct SharedCatalog {
    inner: Arc<Mutex<Catalog>>,
}

impl SharedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(Mutex::new(catalog)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Catalog>, Error> {
        self.inner.lock().map_err(|_| Error::LockPoisoned)
    }

    pub fn find(&self, pattern: &Pattern, flags: MatchFlags) -> Result<Vec<MediaRecord>, Error> {
        self.lock()?.find(pattern, flags)
    }

    pub fn add(&self, draft: MediaDraft, fs: &dyn Filesystem) -> Result<(), Error> {
        self.lock()?.add(draft, fs)
    }

    pub fn remove(&self, pattern: &Pattern, flags: MatchFlags) -> Result<Vec<MediaRecord>, Error> {
        self.lock()?.remove(pattern, flags)
    }

    pub fn update(&self, search: &Pattern, patch: &Patch, flags: MatchFlags) -> Result<usize, Error> {
        self.lock()?.update(search, patch, flags)
    }

    pub fn move_dir(&self, from: &str, to: &str) -> Result<usize, Error> {
        Ok(self.lock()?.move_dir(from, to))
    }

    /// Run `f` against the catalog under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&Catalog) -> R) -> Result<R, Error> {
        Ok(f(&*self.lock()?))
    }

    /// Mutate the catalog under the lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut Catalog) -> R) -> Result<R, Error> {
        Ok(f(&mut *self.lock()?))
    }

    /// Copy of the current catalog state.
    pub fn snapshot(&self) -> Result<Catalog, Error> {
        self.read(Catalog::clone)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let catalog = self.lock()?;
        super::snapshot::save(&catalog, path)
    }
}
