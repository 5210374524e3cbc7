//! Core namespace value types.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// File kind. The namespace is read-only, so symlinks are always
/// resolved by the backing store and never surface here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileKind {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileKind::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileKind::Directory)
    }
}

/// File metadata as returned by `stat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMeta {
    /// File kind.
    pub kind: FileKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, when the backing store knows one.
    pub modified: Option<SystemTime>,
}

impl FileMeta {
    /// Metadata for a regular file.
    pub fn file(size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            kind: FileKind::File,
            size,
            modified,
        }
    }

    /// Metadata for a directory, including synthesized ones that exist
    /// only because something is mounted beneath them.
    pub fn directory() -> Self {
        Self {
            kind: FileKind::Directory,
            size: 0,
            modified: None,
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Directory entry in a merged `read_dir` result. Unique by `name`
/// within one listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry kind.
    pub kind: FileKind,
    /// Size in bytes, when known.
    pub size: Option<u64>,
    /// Last modification time, when known.
    pub modified: Option<SystemTime>,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, kind: FileKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: None,
            modified: None,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FileKind::File)
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, FileKind::Directory)
    }
}
