#![allow(dead_code)]

use media_monitor_core::{Filesystem, Probed};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const ROOT: &str = "/watch";

/// In-memory filesystem: files carry a content hash, sizes and creation
/// times are always unknown.
#[derive(Default)]
pub struct FakeFilesystem {
    files: Mutex<HashMap<PathBuf, Probed<String>>>,
    dirs: Mutex<HashSet<PathBuf>>,
    removed: Mutex<Vec<PathBuf>>,
    fail_removal: bool,
}

impl FakeFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_removal() -> Self {
        Self {
            fail_removal: true,
            ..Self::default()
        }
    }

    pub fn with_file(self, path: impl Into<PathBuf>, hash: &str) -> Self {
        self.add_file(path, hash);
        self
    }

    pub fn with_unhashable_file(self, path: impl Into<PathBuf>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), Probed::Unknown);
        self
    }

    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.dirs.lock().unwrap().insert(path.into());
        self
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, hash: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), Probed::Known(hash.to_string()));
    }

    /// Move a file's content to a new path, as `fs::rename` would.
    pub fn rename_file(&self, from: &Path, to: impl Into<PathBuf>) {
        let mut files = self.files.lock().unwrap();
        if let Some(hash) = files.remove(from) {
            files.insert(to.into(), hash);
        }
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.lock().unwrap().clone()
    }
}

impl Filesystem for FakeFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path) || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }

    fn size(&self, _path: &Path) -> Probed<u64> {
        Probed::Unknown
    }

    fn created(&self, _path: &Path) -> Probed<i64> {
        Probed::Unknown
    }

    fn content_hash(&self, path: &Path) -> Probed<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or(Probed::Unknown)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        if self.fail_removal {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        match self.files.lock().unwrap().remove(path) {
            Some(_) => {
                self.removed.lock().unwrap().push(path.to_path_buf());
                Ok(())
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        }
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

pub fn root_path(relative: &str) -> PathBuf {
    Path::new(ROOT).join(relative)
}
