use crate::catalog::Probed;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

const HASH_CHUNK_SIZE: usize = 4096;

/// Filesystem queries and side effects the engine needs. Probes never
/// fail: anything that cannot be read is reported as `Unknown`.
pub trait Filesystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn size(&self, path: &Path) -> Probed<u64>;
    /// Creation time as whole seconds since the Unix epoch.
    fn created(&self, path: &Path) -> Probed<i64>;
    fn content_hash(&self, path: &Path) -> Probed<String>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    /// Absolute form of `path` with symlinks and `.`/`..` resolved.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn size(&self, path: &Path) -> Probed<u64> {
        fs::metadata(path).map(|m| m.len()).ok().into()
    }

    fn created(&self, path: &Path) -> Probed<i64> {
        fs::metadata(path)
            .and_then(|m| m.created().or_else(|_| m.modified()))
            .ok()
            .and_then(unix_seconds)
            .into()
    }

    fn content_hash(&self, path: &Path) -> Probed<String> {
        match hash_file(path) {
            Ok(hash) => Probed::Known(hash),
            Err(e) => {
                trace!("Could not hash '{}': {}", path.display(), e);
                Probed::Unknown
            }
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

fn unix_seconds(time: SystemTime) -> Option<i64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
}

/// BLAKE3 digest of the whole file, read in fixed-size chunks, as lowercase hex.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut f = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];
    loop {
        let bytes_read = f.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
