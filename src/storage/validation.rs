//! Path validation
//!
//! Turns untrusted client path strings into absolute paths confined to the
//! storage root. Nothing here touches the filesystem.

use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;

/// The storage root every resolved path is confined to.
///
/// Built once at startup and shared read-only by every session.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

/// A client path that passed validation.
///
/// `relative` is the canonical forward-slash form (no empty or `.` segments,
/// empty for the root itself); `absolute` is always inside the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    relative: String,
    absolute: PathBuf,
}

impl Sandbox {
    /// Creates a sandbox around `root`, which must be absolute.
    ///
    /// The root is normalized lexically; callers wanting symlinks in the root
    /// itself resolved should canonicalize it first.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(StorageError::InvalidPath(format!(
                "storage root must be absolute: {}",
                root.display()
            )));
        }

        Ok(Self {
            root: lexical_normalize(&root),
        })
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a client-supplied relative path.
    ///
    /// Traversal is rejected twice: syntactically, when any segment of the
    /// separator-normalized input is `..`, and structurally, when the joined
    /// result does not start with the root. An empty input resolves to the
    /// root itself.
    pub fn resolve(&self, relative: &str) -> Result<ResolvedPath, StorageError> {
        let normalized = normalize_separators(relative);

        if normalized.contains('\0') {
            return Err(StorageError::InvalidPath(format!(
                "{}: contains NUL byte",
                relative.escape_debug()
            )));
        }

        if normalized.split('/').any(|segment| segment == "..") {
            return Err(StorageError::InvalidPath(format!(
                "{}: traversal",
                relative
            )));
        }

        let mut absolute = self.root.clone();
        let mut segments = Vec::new();

        for segment in normalized.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }

            // A segment must stay a single plain name once handed to `Path`
            // (drive prefixes and similar would replace the root on push).
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => {}
                _ => {
                    return Err(StorageError::InvalidPath(format!(
                        "{}: malformed segment '{}'",
                        relative, segment
                    )));
                }
            }

            absolute.push(segment);
            segments.push(segment);
        }

        if !absolute.starts_with(&self.root) {
            return Err(StorageError::InvalidPath(format!(
                "{}: outside storage",
                relative
            )));
        }

        Ok(ResolvedPath {
            relative: segments.join("/"),
            absolute,
        })
    }
}

impl ResolvedPath {
    /// Canonical relative form, empty for the root.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Absolute location inside the storage root.
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }

    /// Relative path of the containing directory, empty at the top level.
    pub fn parent_relative(&self) -> &str {
        match self.relative.rfind('/') {
            Some(idx) => &self.relative[..idx],
            None => "",
        }
    }

    /// Last segment of the relative path.
    pub fn file_name(&self) -> &str {
        match self.relative.rfind('/') {
            Some(idx) => &self.relative[idx + 1..],
            None => &self.relative,
        }
    }
}

/// Converts backslashes to forward slashes.
pub fn normalize_separators(raw: &str) -> String {
    raw.replace('\\', "/")
}

/// Joins a directory and a child using the relative path convention.
pub fn join_relative(dir: &str, child: &str) -> String {
    if dir.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", dir, child)
    }
}

/// Resolves `.` and `..` components without consulting the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> Sandbox {
        Sandbox::new(std::env::temp_dir().join("scoped-fm-root")).unwrap()
    }

    #[test]
    fn test_empty_resolves_to_root() {
        let sandbox = sandbox();
        let resolved = sandbox.resolve("").unwrap();
        assert!(resolved.is_root());
        assert_eq!(resolved.absolute(), sandbox.root());
    }

    #[test]
    fn test_rejects_parent_segments_in_any_position() {
        let sandbox = sandbox();
        for input in [
            "..",
            "../etc/passwd",
            "a/../b",
            "a/b/..",
            "a/b/../",
            "..\\windows",
            "a\\..\\..\\b",
            "/../x",
            "./..",
        ] {
            match sandbox.resolve(input) {
                Err(StorageError::InvalidPath(_)) => {}
                other => panic!("expected InvalidPath for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_dotted_names_are_not_traversal() {
        let sandbox = sandbox();
        let resolved = sandbox.resolve("notes/...hidden/v1..2.txt").unwrap();
        assert_eq!(resolved.relative(), "notes/...hidden/v1..2.txt");
    }

    #[test]
    fn test_resolved_paths_stay_under_root() {
        let sandbox = sandbox();
        for input in ["a", "a/b/c.txt", "/etc/passwd", "//x//y/", "./a/./b", "a\\b"] {
            let resolved = sandbox.resolve(input).unwrap();
            assert!(
                resolved.absolute().starts_with(sandbox.root()),
                "{:?} escaped to {:?}",
                input,
                resolved.absolute()
            );
        }
    }

    #[test]
    fn test_normalizes_separators_and_dots() {
        let sandbox = sandbox();
        let resolved = sandbox.resolve("docs\\\\reports/./2024//q1.txt").unwrap();
        assert_eq!(resolved.relative(), "docs/reports/2024/q1.txt");
        assert_eq!(
            resolved.absolute(),
            sandbox.root().join("docs").join("reports").join("2024").join("q1.txt")
        );
    }

    #[test]
    fn test_absolute_looking_input_is_joined_under_root() {
        let sandbox = sandbox();
        let resolved = sandbox.resolve("/etc/passwd").unwrap();
        assert_eq!(resolved.absolute(), sandbox.root().join("etc").join("passwd"));
    }

    #[test]
    fn test_rejects_nul_byte() {
        assert!(matches!(
            sandbox().resolve("a\0b"),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let root = std::env::temp_dir().join("scoped-fm-never-created");
        let sandbox = Sandbox::new(&root).unwrap();
        let first = sandbox.resolve("x/y/z.bin").unwrap();
        let second = sandbox.resolve("x/y/z.bin").unwrap();
        assert_eq!(first, second);
        assert!(!root.exists());
    }

    #[test]
    fn test_relative_root_is_rejected() {
        assert!(matches!(
            Sandbox::new("storage"),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_root_is_normalized_lexically() {
        let base = std::env::temp_dir();
        let sandbox = Sandbox::new(base.join("a").join("..").join("root")).unwrap();
        assert_eq!(sandbox.root(), lexical_normalize(&base.join("root")));
    }

    #[test]
    fn test_parent_relative_and_file_name() {
        let sandbox = sandbox();
        let nested = sandbox.resolve("a/b/c.txt").unwrap();
        assert_eq!(nested.parent_relative(), "a/b");
        assert_eq!(nested.file_name(), "c.txt");

        let top = sandbox.resolve("c.txt").unwrap();
        assert_eq!(top.parent_relative(), "");
        assert_eq!(top.file_name(), "c.txt");
    }

    #[test]
    fn test_join_relative() {
        assert_eq!(join_relative("", "a.txt"), "a.txt");
        assert_eq!(join_relative("docs", "a.txt"), "docs/a.txt");
    }
}
