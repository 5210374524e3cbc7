//! Physical directory backend.
//!
//! Exposes one real directory subtree (a toolchain root, a workspace
//! root) as a read-only filesystem capability. Every call acquires a
//! gate pass before issuing the underlying system call; the pass is
//! dropped on all exit paths, errors included.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::error::{VfsError, VfsResult};
use crate::gate::AccessGate;
use crate::ops::{FileReader, FileSystem};
use crate::types::{DirEntry, FileKind, FileMeta};

/// Read-only view of a real directory tree, routed through an
/// [`AccessGate`].
///
/// All operations are relative to `root`. If `root` is `/usr/local/go`,
/// then `open("src/fmt/print.go")` reads `/usr/local/go/src/fmt/print.go`.
/// Traversal outside the root is rejected before any I/O.
#[derive(Debug, Clone)]
pub struct LocalRoot {
    root: PathBuf,
    gate: AccessGate,
}

impl LocalRoot {
    /// Create a physical root. The path is canonicalized at
    /// construction so symlinked roots resolve once, not per call.
    pub fn new(root: impl Into<PathBuf>, gate: AccessGate) -> Self {
        let root: PathBuf = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self { root, gate }
    }

    /// The real directory backing this root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a virtual relative path onto the real tree.
    ///
    /// Only plain segments are accepted; `..` and absolute inputs fail
    /// with `InvalidPath` without consulting the OS.
    fn resolve(&self, path: &Path) -> VfsResult<PathBuf> {
        let path = path.strip_prefix("/").unwrap_or(path);
        if path.as_os_str().is_empty() {
            return Ok(self.root.clone());
        }

        let mut real = self.root.clone();
        for component in path.components() {
            match component {
                Component::Normal(segment) => real.push(segment),
                Component::CurDir => {}
                _ => return Err(VfsError::invalid_path(path.display().to_string())),
            }
        }
        Ok(real)
    }

    fn meta_from(meta: &std::fs::Metadata) -> FileMeta {
        FileMeta {
            kind: if meta.is_dir() {
                FileKind::Directory
            } else {
                FileKind::File
            },
            size: meta.len(),
            modified: meta.modified().ok(),
        }
    }
}

#[async_trait]
impl FileSystem for LocalRoot {
    async fn open(&self, path: &Path) -> VfsResult<FileReader> {
        let real = self.resolve(path)?;
        let _pass = self.gate.enter().await;
        let file = fs::File::open(&real)
            .await
            .map_err(|e| VfsError::from_io(path, e))?;
        Ok(Box::pin(file))
    }

    async fn stat(&self, path: &Path) -> VfsResult<FileMeta> {
        let real = self.resolve(path)?;
        let _pass = self.gate.enter().await;
        let meta = fs::metadata(&real)
            .await
            .map_err(|e| VfsError::from_io(path, e))?;
        Ok(Self::meta_from(&meta))
    }

    async fn read_dir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let real = self.resolve(path)?;
        let _pass = self.gate.enter().await;
        let mut dir = fs::read_dir(&real)
            .await
            .map_err(|e| VfsError::from_io(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| VfsError::from_io(path, e))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|e| VfsError::from_io(path, e))?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: if meta.is_dir() {
                    FileKind::Directory
                } else {
                    FileKind::File
                },
                size: Some(meta.len()),
                modified: meta.modified().ok(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (LocalRoot, TempDir) {
        let dir = TempDir::new().unwrap();
        let root = LocalRoot::new(dir.path(), AccessGate::default());
        (root, dir)
    }

    #[tokio::test]
    async fn test_open_and_read() {
        let (root, dir) = setup();
        std::fs::write(dir.path().join("doc.txt"), "hello world").unwrap();

        let data = root.read_all(Path::new("doc.txt")).await.unwrap();
        assert_eq!(data, b"hello world");
    }

    #[tokio::test]
    async fn test_stat() {
        let (root, dir) = setup();
        std::fs::write(dir.path().join("doc.txt"), "hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let meta = root.stat(Path::new("doc.txt")).await.unwrap();
        assert!(meta.is_file());
        assert_eq!(meta.size, 5);
        assert!(meta.modified.is_some());

        let meta = root.stat(Path::new("sub")).await.unwrap();
        assert!(meta.is_dir());

        let meta = root.stat(Path::new("")).await.unwrap();
        assert!(meta.is_dir());
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let (root, _dir) = setup();

        let err = root.stat(Path::new("nope.txt")).await.unwrap_err();
        assert!(err.is_not_found());

        let err = root.open(Path::new("nope.txt")).await.err().unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_read_dir_sorted() {
        let (root, dir) = setup();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("c")).unwrap();

        let entries = root.read_dir(Path::new("")).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c"]);
        assert!(entries[2].kind.is_dir());

        // Stable across repeated calls for an unchanged directory.
        let again = root.read_dir(Path::new("")).await.unwrap();
        let names_again: Vec<_> = again.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, names_again);
    }

    #[tokio::test]
    async fn test_traversal_rejected_before_io() {
        let (root, _dir) = setup();

        let err = root.open(Path::new("../../etc/passwd")).await.err().unwrap();
        assert!(matches!(err, VfsError::InvalidPath(_)));

        let err = root.read_dir(Path::new("sub/../..")).await.unwrap_err();
        assert!(matches!(err, VfsError::InvalidPath(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gated_opens_all_complete() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("doc.txt"), "contents").unwrap();
        let gate = AccessGate::new(4);
        let root = LocalRoot::new(dir.path(), gate.clone());

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let root = root.clone();
                tokio::spawn(async move { root.read_all(Path::new("doc.txt")).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), b"contents");
        }
        assert_eq!(gate.available(), 4);
    }
}
