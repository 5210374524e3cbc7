//! Read-only filesystem capability trait.
//!
//! The three operations here are the entire surface a documentation
//! indexer or page renderer needs to walk and read the merged tree.
//! Backing stores and the namespace itself all implement the same trait,
//! so consumers never know how many physical trees sit underneath.

use async_trait::async_trait;
use std::path::Path;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::VfsResult;
use super::types::{DirEntry, FileMeta};

/// Byte stream handed out by [`FileSystem::open`].
pub type FileReader = Pin<Box<dyn AsyncRead + Send>>;

/// Read-only filesystem capability: `{open, stat, read_dir}`.
///
/// Paths handed to a backing store are relative to that store's root;
/// the namespace handles mountpoint stripping. Implementations map OS
/// failures into the [`VfsError`](crate::VfsError) taxonomy and never
/// retry.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Open a file for reading.
    async fn open(&self, path: &Path) -> VfsResult<FileReader>;

    /// Get file metadata.
    async fn stat(&self, path: &Path) -> VfsResult<FileMeta>;

    /// Read directory entries, sorted by name. Ordering is stable
    /// across repeated calls for an unchanged directory.
    async fn read_dir(&self, path: &Path) -> VfsResult<Vec<DirEntry>>;

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> bool {
        self.stat(path).await.is_ok()
    }

    /// Read entire file contents.
    async fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let mut reader = self.open(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}
