//! Overlay namespace: ordered bindings with deterministic shadowing.
//!
//! A [`Namespace`] merges several backing stores into one read-only
//! virtual tree. Each binding attaches a store at a mountpoint with an
//! overlay mode:
//!
//! - [`BindMode::Replace`] shadows every binding registered before it
//!   whose mountpoint covers the same subtree; the usual way to overlay
//!   a curated tree (the UI asset bundle) on a generic one.
//! - [`BindMode::After`] fills in whatever nothing else resolved; the
//!   usual way to append workspace roots behind the toolchain root.
//! - [`BindMode::Before`] outranks everything; kept for generality,
//!   the standard deployment never uses it.
//!
//! Lookups snapshot the binding list under a read lock and do all I/O
//! outside it, so concurrent lookups run fully in parallel and always
//! agree for a fixed binding list. `bind`/`unbind` take the write lock;
//! in the standard deployment they run once at startup, before any
//! lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::{VfsError, VfsResult};
use super::ops::{FileReader, FileSystem};
use super::types::{DirEntry, FileMeta};

/// Overlay mode of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindMode {
    /// Consulted before every other mode.
    Before,
    /// Shadows bindings registered earlier for the overlapping subtree.
    Replace,
    /// Fallback: consulted only after all Before/Replace bindings.
    After,
}

impl BindMode {
    fn rank(self) -> u8 {
        match self {
            BindMode::Before => 0,
            BindMode::Replace => 1,
            BindMode::After => 2,
        }
    }
}

/// One mountpoint→store association inside the namespace.
struct Binding {
    /// Normalized absolute mountpoint ("/" or "/lib/docs").
    mountpoint: String,
    fs: Arc<dyn FileSystem>,
    mode: BindMode,
    /// Insertion order, the precedence tie-break.
    seq: u64,
}

impl Binding {
    /// Relative path under this binding, if its mountpoint is the path
    /// or a segment-aligned prefix of it.
    fn rebase(&self, path: &str) -> Option<PathBuf> {
        if self.mountpoint == "/" {
            return Some(PathBuf::from(path.trim_start_matches('/')));
        }
        match path.strip_prefix(self.mountpoint.as_str()) {
            Some("") => Some(PathBuf::new()),
            Some(rest) => rest.strip_prefix('/').map(PathBuf::from),
            None => None,
        }
    }

    /// First path segment of this mountpoint strictly below `dir`, if
    /// the mountpoint lives underneath it.
    fn segment_under(&self, dir: &str) -> Option<&str> {
        let rest = if dir == "/" {
            self.mountpoint.strip_prefix('/')?
        } else {
            self.mountpoint
                .strip_prefix(dir)?
                .strip_prefix('/')?
        };
        let first = rest.split('/').next()?;
        (!first.is_empty()).then_some(first)
    }
}

/// Snapshot of one applicable binding, taken under the read lock.
struct Layer {
    fs: Arc<dyn FileSystem>,
    rel: PathBuf,
    mode: BindMode,
    seq: u64,
}

#[derive(Default)]
struct BindTable {
    bindings: Vec<Binding>,
    next_seq: u64,
}

/// Public description of a binding, for startup logging and tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingInfo {
    /// Normalized mountpoint.
    pub mountpoint: String,
    /// Overlay mode.
    pub mode: BindMode,
    /// Insertion order.
    pub seq: u64,
}

/// The merged, read-only virtual filesystem.
///
/// Implements [`FileSystem`] itself, so consumers hold an
/// `Arc<Namespace>` and never touch the backing stores directly.
pub struct Namespace {
    table: RwLock<BindTable>,
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("table", &"<locked>")
            .finish()
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl Namespace {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(BindTable::default()),
        }
    }

    /// Attach a backing store at `mountpoint` with the given mode.
    ///
    /// Bindings are appended; precedence between overlapping bindings
    /// comes from `(mode, insertion order)` at resolution time.
    pub async fn bind(
        &self,
        mountpoint: impl AsRef<Path>,
        fs: Arc<dyn FileSystem>,
        mode: BindMode,
    ) -> VfsResult<()> {
        let mountpoint = clean_path(mountpoint.as_ref())?;
        let mut table = self.table.write().await;
        let seq = table.next_seq;
        table.next_seq += 1;
        tracing::debug!(%mountpoint, ?mode, seq, "binding filesystem");
        table.bindings.push(Binding {
            mountpoint,
            fs,
            mode,
            seq,
        });
        Ok(())
    }

    /// Detach the first binding matching `mountpoint` and the same
    /// store. Returns `true` if one was removed.
    pub async fn unbind(
        &self,
        mountpoint: impl AsRef<Path>,
        fs: &Arc<dyn FileSystem>,
    ) -> VfsResult<bool> {
        let mountpoint = clean_path(mountpoint.as_ref())?;
        let mut table = self.table.write().await;
        let found = table
            .bindings
            .iter()
            .position(|b| b.mountpoint == mountpoint && Arc::ptr_eq(&b.fs, fs));
        match found {
            Some(index) => {
                let removed = table.bindings.remove(index);
                tracing::debug!(mountpoint = %removed.mountpoint, seq = removed.seq, "unbound filesystem");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Describe the current bindings in insertion order.
    pub async fn bindings(&self) -> Vec<BindingInfo> {
        let table = self.table.read().await;
        table
            .bindings
            .iter()
            .map(|b| BindingInfo {
                mountpoint: b.mountpoint.clone(),
                mode: b.mode,
                seq: b.seq,
            })
            .collect()
    }

    /// Snapshot the applicable bindings for `path`, highest precedence
    /// first. The read lock is released before any I/O happens.
    async fn applicable(&self, path: &str) -> Vec<Layer> {
        let table = self.table.read().await;
        let mut layers: Vec<Layer> = table
            .bindings
            .iter()
            .filter_map(|b| {
                b.rebase(path).map(|rel| Layer {
                    fs: Arc::clone(&b.fs),
                    rel,
                    mode: b.mode,
                    seq: b.seq,
                })
            })
            .collect();

        layers.sort_by(|a, b| {
            a.mode.rank().cmp(&b.mode.rank()).then_with(|| match a.mode {
                // After bindings are appended: earliest bound is tried first.
                BindMode::After => a.seq.cmp(&b.seq),
                // Before/Replace: a later binding shadows earlier ones
                // covering the same subtree.
                _ => b.seq.cmp(&a.seq),
            })
        });
        layers
    }

    /// True if `path` is the root or a proper ancestor of some
    /// mountpoint; such directories exist even when no backing store
    /// has them.
    async fn is_synthetic_dir(&self, path: &str) -> bool {
        if path == "/" {
            return true;
        }
        let table = self.table.read().await;
        table.bindings.iter().any(|b| b.segment_under(path).is_some())
    }

    /// Synthetic entries for mountpoints strictly below `path`.
    async fn synthetic_entries(&self, path: &str) -> Vec<DirEntry> {
        let table = self.table.read().await;
        let mut names: Vec<String> = table
            .bindings
            .iter()
            .filter_map(|b| b.segment_under(path).map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        names.into_iter().map(DirEntry::directory).collect()
    }
}

#[async_trait]
impl FileSystem for Namespace {
    async fn open(&self, path: &Path) -> VfsResult<FileReader> {
        let path = clean_path(path)?;
        for layer in self.applicable(&path).await {
            match layer.fs.open(&layer.rel).await {
                Ok(reader) => return Ok(reader),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(VfsError::not_found(path))
    }

    async fn stat(&self, path: &Path) -> VfsResult<FileMeta> {
        let path = clean_path(path)?;
        for layer in self.applicable(&path).await {
            match layer.fs.stat(&layer.rel).await {
                Ok(meta) => return Ok(meta),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        // Directories that exist only because something is mounted
        // beneath them.
        if self.is_synthetic_dir(&path).await {
            return Ok(FileMeta::directory());
        }
        Err(VfsError::not_found(path))
    }

    async fn read_dir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let path = clean_path(path)?;
        let mut merged: BTreeMap<String, DirEntry> = BTreeMap::new();
        let mut found = false;

        for layer in self.applicable(&path).await {
            match layer.fs.read_dir(&layer.rel).await {
                Ok(entries) => {
                    found = true;
                    for entry in entries {
                        // First writer wins: higher-precedence layers
                        // were consulted first.
                        merged.entry(entry.name.clone()).or_insert(entry);
                    }
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        let synthetic = self.synthetic_entries(&path).await;
        if !synthetic.is_empty() {
            found = true;
            for entry in synthetic {
                merged.entry(entry.name.clone()).or_insert(entry);
            }
        }

        if !found && path != "/" {
            return Err(VfsError::not_found(path));
        }
        Ok(merged.into_values().collect())
    }
}

/// Normalize a request path to "/a/b" form.
///
/// `.` and empty segments collapse; a missing leading slash is
/// tolerated; `..` and non-UTF-8 input fail with `InvalidPath` before
/// any binding is consulted.
fn clean_path(path: &Path) -> VfsResult<String> {
    let raw = path
        .to_str()
        .ok_or_else(|| VfsError::invalid_path(path.display().to_string()))?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(VfsError::invalid_path(raw)),
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(format!("/{}", segments.join("/")))
    }
}
