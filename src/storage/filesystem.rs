//! File system operations
//!
//! Low-level helpers the engine composes. Callers pass only resolved paths.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Result, Write};
use std::path::Path;

/// Create any missing parent directories of `path`
pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

/// Open `path` for writing, failing with `AlreadyExists` if anything is there
pub fn create_exclusive(path: &Path) -> Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Write `bytes` to a file that must not exist yet
///
/// A partially written file is removed before the error is returned.
pub fn write_new(path: &Path, bytes: &[u8]) -> Result<u64> {
    let mut file = create_exclusive(path)?;
    if let Err(e) = file.write_all(bytes).and_then(|_| file.flush()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(bytes.len() as u64)
}

/// Copy `source` into a file at `target` that must not exist yet
///
/// On any failure after `target` was created it is removed again.
pub fn copy_new(source: &Path, target: &Path) -> Result<u64> {
    let mut reader = File::open(source)?;
    let permissions = reader.metadata()?.permissions();
    let mut writer = create_exclusive(target)?;

    let copied = io::copy(&mut reader, &mut writer)
        .and_then(|n| writer.flush().map(|_| n))
        .and_then(|n| writer.set_permissions(permissions).map(|_| n));

    match copied {
        Ok(n) => Ok(n),
        Err(e) => {
            drop(writer);
            let _ = fs::remove_file(target);
            Err(e)
        }
    }
}

/// Check if anything (file, folder, or dangling link) occupies `path`
pub fn path_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
