use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("Catalog holds {count} records for '{file}' in '{dir}', full catalog audit needed")]
    Integrity {
        file: String,
        dir: String,
        count: usize,
    },

    #[error("Path {path:?} is not under watch root {root:?}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Rename of {0:?} has no target path")]
    MissingRenameTarget(PathBuf),

    #[error("Malformed query term: {0}")]
    MalformedQuery(String),

    #[error("Catalog lock poisoned")]
    LockPoisoned,

    #[error("Catalog worker is not running")]
    WorkerStopped,

    #[error("Catalog worker panicked")]
    WorkerPanicked,
}
