//! File system storage management
//!
//! Path sandboxing and the file operations built on it.

pub mod filesystem;
pub mod operations;
pub mod results;
pub mod validation;

// Re-export commonly used types
pub use operations::FileManager;
pub use results::{Crumb, DirectoryEntry, EntryKind, ListResult, MutationResult, Upload};
pub use validation::{ResolvedPath, Sandbox};
