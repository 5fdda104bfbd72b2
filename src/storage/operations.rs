//! Storage operations
//!
//! The file operation engine: list, create, delete, upload, copy and move,
//! all confined to the sandbox root.
//!
//! Existence checks and the writes that follow are separate filesystem calls,
//! so two sessions targeting the same path can race between them. Writes of
//! new files go through an exclusive create, which turns the file-level race
//! into an `AlreadyExists` error; folder creation and parent-directory
//! creation remain check-then-act and are not coordinated across sessions.

use log::{error, info, warn};
use std::fs;
use std::io;

use crate::error::StorageError;
use crate::storage::filesystem::{copy_new, ensure_parent, path_occupied, write_new};
use crate::storage::results::{
    DirectoryEntry, EntryKind, ListResult, MutationResult, Upload, build_breadcrumb,
};
use crate::storage::validation::{ResolvedPath, Sandbox, join_relative, normalize_separators};

/// Filesystem operation engine bound to one storage root
#[derive(Debug, Clone)]
pub struct FileManager {
    sandbox: Sandbox,
}

impl FileManager {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Lists a directory, entries sorted by name, with its breadcrumb
    pub fn list(&self, dir: &str) -> Result<ListResult, StorageError> {
        let directory = self.sandbox.resolve(dir)?;

        let metadata = fs::metadata(directory.absolute())
            .map_err(|e| not_found_or_io(e, &directory))?;
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(display(&directory)));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(directory.absolute())? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) if is_addressable(&name) => name,
                Ok(name) => {
                    warn!("Skipping {:?} in {}: name cannot be addressed", name, display(&directory));
                    continue;
                }
                Err(raw) => {
                    warn!("Skipping {:?} in {}: name is not UTF-8", raw, display(&directory));
                    continue;
                }
            };
            let relative_path = join_relative(directory.relative(), &name);

            let (kind, size) = match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => (EntryKind::Folder, None),
                Ok(meta) => (EntryKind::File, Some(meta.len())),
                Err(e) => {
                    // Dangling links and the like: keep the row, drop the size.
                    warn!("Cannot stat {}: {}", relative_path, e);
                    let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                    let kind = if is_dir { EntryKind::Folder } else { EntryKind::File };
                    (kind, None)
                }
            };

            entries.push(DirectoryEntry {
                name,
                relative_path,
                kind,
                size,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            "Listed directory {} (real: {}) - {} entries",
            display(&directory),
            directory.absolute().display(),
            entries.len()
        );

        let breadcrumb = build_breadcrumb(directory.relative());
        Ok(ListResult {
            directory,
            entries,
            breadcrumb,
        })
    }

    /// Creates a new text file, creating missing parent directories
    pub fn create_file(&self, path: &str, content: &str) -> Result<MutationResult, StorageError> {
        let target = self.resolve_target(path)?;
        require_vacant(&target)?;

        ensure_parent(target.absolute())?;
        let bytes_written =
            write_new(target.absolute(), content.as_bytes()).map_err(|e| exists_or_io(e, &target))?;

        info!(
            "Created file {} (real: {}, {} bytes)",
            target.relative(),
            target.absolute().display(),
            bytes_written
        );

        Ok(mutation(target, bytes_written))
    }

    /// Deletes a regular file
    pub fn delete_file(&self, path: &str) -> Result<MutationResult, StorageError> {
        let target = self.resolve_target(path)?;
        require_file(&target)?;

        fs::remove_file(target.absolute()).map_err(|e| {
            error!("Failed to delete file {}: {}", target.relative(), e);
            not_found_or_io(e, &target)
        })?;

        info!(
            "Deleted file {} (real: {})",
            target.relative(),
            target.absolute().display()
        );

        Ok(mutation(target, 0))
    }

    /// Creates a folder and any missing ancestors
    pub fn create_folder(&self, path: &str) -> Result<MutationResult, StorageError> {
        let target = self.resolve_target(path)?;
        require_vacant(&target)?;

        ensure_parent(target.absolute())?;
        fs::create_dir(target.absolute()).map_err(|e| exists_or_io(e, &target))?;

        info!(
            "Created folder {} (real: {})",
            target.relative(),
            target.absolute().display()
        );

        Ok(mutation(target, 0))
    }

    /// Stores an uploaded payload in `dir`
    ///
    /// The stored name is `desired_name` when given, otherwise the upload's
    /// original stem; either way the original extension is appended when the
    /// chosen name has none.
    pub fn upload_write(
        &self,
        dir: &str,
        upload: Option<&Upload>,
        desired_name: Option<&str>,
    ) -> Result<MutationResult, StorageError> {
        let directory = self.sandbox.resolve(dir)?;
        let upload = upload.ok_or(StorageError::NoFileProvided)?;

        let final_name = derive_upload_name(&upload.original_name, desired_name)?;
        let target = self
            .sandbox
            .resolve(&join_relative(directory.relative(), &final_name))?;

        let metadata = fs::metadata(directory.absolute())
            .map_err(|e| not_found_or_io(e, &directory))?;
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(display(&directory)));
        }
        require_vacant(&target)?;

        let bytes_written =
            write_new(target.absolute(), &upload.bytes).map_err(|e| exists_or_io(e, &target))?;

        info!(
            "Uploaded {} as {} (real: {}, {} bytes)",
            upload.original_name,
            target.relative(),
            target.absolute().display(),
            bytes_written
        );

        Ok(MutationResult {
            target,
            bytes_written,
            navigate_to: directory.relative().to_string(),
        })
    }

    /// Copies a regular file to a new location
    pub fn copy_file(&self, source: &str, target: &str) -> Result<MutationResult, StorageError> {
        let source = self.resolve_target(source)?;
        let target = self.resolve_target(target)?;
        self.copy_resolved(&source, target)
    }

    /// Moves a regular file: copy, then delete the source
    ///
    /// Not atomic. If the delete fails after a successful copy both files stay
    /// in place and the delete failure is returned as `IoError`.
    pub fn move_file(&self, source: &str, target: &str) -> Result<MutationResult, StorageError> {
        let source = self.resolve_target(source)?;
        let target = self.resolve_target(target)?;
        let result = self.copy_resolved(&source, target)?;

        if let Err(e) = fs::remove_file(source.absolute()) {
            warn!(
                "Moved {} to {} but could not remove the source, both copies remain: {}",
                source.relative(),
                result.target.relative(),
                e
            );
            return Err(StorageError::IoError(io::Error::new(
                e.kind(),
                format!(
                    "copied to {} but failed to remove {}: {}",
                    result.target.relative(),
                    source.relative(),
                    e
                ),
            )));
        }

        info!(
            "Moved file {} to {}",
            source.relative(),
            result.target.relative()
        );

        Ok(result)
    }

    fn copy_resolved(
        &self,
        source: &ResolvedPath,
        target: ResolvedPath,
    ) -> Result<MutationResult, StorageError> {
        require_file(source)?;
        require_vacant(&target)?;

        ensure_parent(target.absolute())?;
        let bytes_written = copy_new(source.absolute(), target.absolute())
            .map_err(|e| exists_or_io(e, &target))?;

        info!(
            "Copied file {} to {} ({} bytes)",
            source.relative(),
            target.relative(),
            bytes_written
        );

        Ok(mutation(target, bytes_written))
    }

    /// Resolves a path that names something other than the root
    fn resolve_target(&self, path: &str) -> Result<ResolvedPath, StorageError> {
        let resolved = self.sandbox.resolve(path)?;
        if resolved.is_root() {
            return Err(StorageError::InvalidPath("path is required".into()));
        }
        Ok(resolved)
    }
}

/// Picks the stored file name for an upload
pub fn derive_upload_name(
    original_name: &str,
    desired_name: Option<&str>,
) -> Result<String, StorageError> {
    let original = normalize_separators(original_name);
    let base = original.rsplit('/').next().unwrap_or_default();
    let (stem, extension) = split_extension(base);

    let desired = desired_name.map(str::trim).filter(|n| !n.is_empty());
    if let Some(name) = desired {
        if name.contains('/') || name.contains('\\') {
            return Err(StorageError::InvalidPath(format!(
                "{}: file name must not contain separators",
                name
            )));
        }
    }

    let mut final_name = desired.unwrap_or(stem).to_string();
    if split_extension(&final_name).1.is_empty() {
        final_name.push_str(extension);
    }

    if final_name.is_empty() || final_name == "." || final_name == ".." {
        return Err(StorageError::InvalidPath(format!(
            "{:?}: not a usable file name",
            final_name
        )));
    }

    Ok(final_name)
}

/// Splits `name` into stem and extension (with its dot); a leading dot
/// starts the stem, not an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

fn mutation(target: ResolvedPath, bytes_written: u64) -> MutationResult {
    let navigate_to = target.parent_relative().to_string();
    MutationResult {
        target,
        bytes_written,
        navigate_to,
    }
}

fn require_vacant(path: &ResolvedPath) -> Result<(), StorageError> {
    if path_occupied(path.absolute()) {
        return Err(StorageError::AlreadyExists(display(path)));
    }
    Ok(())
}

fn require_file(path: &ResolvedPath) -> Result<(), StorageError> {
    let metadata = fs::metadata(path.absolute()).map_err(|e| not_found_or_io(e, path))?;
    if !metadata.is_file() {
        return Err(StorageError::NotAFile(display(path)));
    }
    Ok(())
}

/// Names that would not survive a round trip through a relative path or a
/// listing row (separators, control characters) are left out of listings.
fn is_addressable(name: &str) -> bool {
    !name.contains('\\') && !name.chars().any(char::is_control)
}

fn not_found_or_io(e: io::Error, path: &ResolvedPath) -> StorageError {
    match e.kind() {
        // A file somewhere along the path: the target cannot exist either.
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
            StorageError::NotFound(display(path))
        }
        _ => StorageError::IoError(e),
    }
}

fn exists_or_io(e: io::Error, path: &ResolvedPath) -> StorageError {
    match e.kind() {
        io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(display(path)),
        _ => {
            error!("Write to {} failed: {}", path.absolute().display(), e);
            StorageError::IoError(e)
        }
    }
}

fn display(path: &ResolvedPath) -> String {
    if path.is_root() {
        "/".to_string()
    } else {
        path.relative().to_string()
    }
}
