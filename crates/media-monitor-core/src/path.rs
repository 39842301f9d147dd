use crate::error::Error;
use std::path::{Component, Path, PathBuf};

/// Split `path` into the `(file, dir)` catalog key relative to `root`.
///
/// `dir` is the name of the immediate parent directory (empty at the root
/// level). For a directory, `file` is empty and `dir` is the directory's
/// own name.
pub fn split_file_and_dir(path: &Path, root: &Path, is_dir: bool) -> Result<(String, String), Error> {
    let outside = || Error::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    };

    let relative = path.strip_prefix(root).map_err(|_| outside())?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(outside()),
        }
    }

    if is_dir {
        let dir = parts.pop().unwrap_or_default();
        return Ok((String::new(), dir));
    }

    let file = parts.pop().unwrap_or_default();
    let dir = parts.pop().unwrap_or_default();
    Ok((file, dir))
}

/// `root/dir/file`, skipping empty components.
pub fn join_relative(root: &Path, dir: &str, file: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    if !dir.is_empty() {
        path.push(dir);
    }
    if !file.is_empty() {
        path.push(file);
    }
    path
}
