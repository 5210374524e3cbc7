//! Built-in asset backend.
//!
//! A fixed, read-only name→content mapping for the server's own UI
//! resources, independent of any indexed source tree. Everything lives
//! in memory, so no gate pass is taken and nothing blocks.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Component, Path};
use std::time::SystemTime;

use crate::error::{VfsError, VfsResult};
use crate::ops::{FileReader, FileSystem};
use crate::types::{DirEntry, FileKind, FileMeta};

/// In-memory read-only asset store.
///
/// Keys are slash-separated relative paths ("css/style.css").
/// Directories are implied by key prefixes: if "css/style.css" exists,
/// `stat("css")` reports a directory and `read_dir("")` lists `css`.
#[derive(Debug, Clone)]
pub struct AssetStore {
    files: BTreeMap<String, Vec<u8>>,
    // The whole bundle shares one timestamp: when the store was built.
    modified: SystemTime,
}

impl AssetStore {
    /// Build a store from name→content pairs. Leading slashes in names
    /// are stripped.
    pub fn new<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let files = files
            .into_iter()
            .map(|(name, data)| {
                let name: String = name.into();
                (name.trim_start_matches('/').to_string(), data.into())
            })
            .collect();
        Self {
            files,
            modified: SystemTime::now(),
        }
    }

    /// Number of assets in the bundle.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if the bundle holds no assets.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Normalize a request path to key form ("" for the root).
    fn key_for(path: &Path) -> VfsResult<String> {
        let mut segments: Vec<&str> = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment
                        .to_str()
                        .ok_or_else(|| VfsError::invalid_path(path.display().to_string()))?;
                    segments.push(segment);
                }
                Component::RootDir | Component::CurDir => {}
                _ => return Err(VfsError::invalid_path(path.display().to_string())),
            }
        }
        Ok(segments.join("/"))
    }

    /// True if any asset lives under `key/`.
    fn is_dir_prefix(&self, key: &str) -> bool {
        let prefix = format!("{key}/");
        self.files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(name, _)| name.starts_with(&prefix))
    }
}

#[async_trait]
impl FileSystem for AssetStore {
    async fn open(&self, path: &Path) -> VfsResult<FileReader> {
        let key = Self::key_for(path)?;
        match self.files.get(&key) {
            Some(data) => Ok(Box::pin(Cursor::new(data.clone()))),
            None => Err(VfsError::not_found(key)),
        }
    }

    async fn stat(&self, path: &Path) -> VfsResult<FileMeta> {
        let key = Self::key_for(path)?;
        if let Some(data) = self.files.get(&key) {
            return Ok(FileMeta::file(data.len() as u64, Some(self.modified)));
        }
        if key.is_empty() || self.is_dir_prefix(&key) {
            return Ok(FileMeta::directory());
        }
        Err(VfsError::not_found(key))
    }

    async fn read_dir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let key = Self::key_for(path)?;
        if !key.is_empty() && !self.is_dir_prefix(&key) {
            return Err(VfsError::not_found(key));
        }

        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        };

        let mut entries: BTreeMap<String, DirEntry> = BTreeMap::new();
        for (name, data) in self.files.range(prefix.clone()..) {
            let Some(rest) = name.strip_prefix(&prefix) else {
                break; // past the prefix range in the sorted map
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    entries
                        .entry(dir.to_string())
                        .or_insert_with(|| DirEntry::directory(dir));
                }
                None => {
                    entries.insert(
                        rest.to_string(),
                        DirEntry {
                            name: rest.to_string(),
                            kind: FileKind::File,
                            size: Some(data.len() as u64),
                            modified: Some(self.modified),
                        },
                    );
                }
            }
        }

        Ok(entries.into_values().collect())
    }
}
