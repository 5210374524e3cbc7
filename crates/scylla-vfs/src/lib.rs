//! # scylla-vfs
//!
//! Overlay virtual filesystem for the scylla documentation server.
//! Several physical source trees (toolchain root, workspace roots) and
//! an in-memory asset bundle are merged into one read-only virtual
//! namespace that the documentation indexer and page renderer walk.
//!
//! Key components:
//!
//! - [`FileSystem`] - Read-only capability trait: `{open, stat, read_dir}`
//! - [`Namespace`] - Ordered bindings with deterministic shadowing
//! - [`LocalRoot`] - One real directory tree, gated physical I/O
//! - [`AssetStore`] - Fixed in-memory name→content bundle
//! - [`AccessGate`] - Bounded-concurrency limiter on physical I/O
//!
//! ## Design decisions
//!
//! - **Explicit namespace value**: the namespace is constructed once at
//!   startup and passed by reference; there is no process-wide mutable
//!   default filesystem.
//! - **Read-mostly**: lookups snapshot the binding list under a read
//!   lock and never hold it across I/O; `bind`/`unbind` take the write
//!   lock and exist for deployments that rebind at runtime.
//! - **NotFound falls through, nothing else does**: a binding that
//!   lacks a path yields to the next applicable binding; permission and
//!   I/O failures surface immediately.

pub mod backends;
mod error;
mod gate;
mod namespace;
mod ops;
mod types;

pub use backends::{AssetStore, LocalRoot};
pub use error::{VfsError, VfsResult};
pub use gate::{AccessGate, GatePass};
pub use namespace::{BindMode, BindingInfo, Namespace};
pub use ops::{FileReader, FileSystem};
pub use types::{DirEntry, FileKind, FileMeta};
