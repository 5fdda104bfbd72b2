//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::fmt;

use crate::storage::validation::ResolvedPath;

/// Kind of a listed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Folder => write!(f, "folder"),
        }
    }
}

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub relative_path: String,
    pub kind: EntryKind,
    /// Size in bytes; `None` for folders.
    pub size: Option<u64>,
}

/// One ancestor in a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub name: String,
    pub path: String,
}

/// Result of a directory listing operation
#[derive(Debug, Clone)]
pub struct ListResult {
    pub directory: ResolvedPath,
    pub entries: Vec<DirectoryEntry>,
    pub breadcrumb: Vec<Crumb>,
}

/// An uploaded payload as received from the client
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

/// Result of any mutating operation
///
/// `navigate_to` is the directory the caller should show next.
#[derive(Debug, Clone)]
pub struct MutationResult {
    pub target: ResolvedPath,
    pub bytes_written: u64,
    pub navigate_to: String,
}

/// Builds the root-first breadcrumb for a canonical relative directory path.
pub fn build_breadcrumb(dir_relative: &str) -> Vec<Crumb> {
    let mut crumbs = vec![Crumb {
        name: "root".to_string(),
        path: String::new(),
    }];

    let mut accumulated = String::new();
    for part in dir_relative.split('/').filter(|p| !p.is_empty()) {
        if !accumulated.is_empty() {
            accumulated.push('/');
        }
        accumulated.push_str(part);
        crumbs.push(Crumb {
            name: part.to_string(),
            path: accumulated.clone(),
        });
    }

    crumbs
}
