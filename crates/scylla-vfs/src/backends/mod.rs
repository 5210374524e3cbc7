//! Backing stores that can be bound into the namespace.

mod assets;
mod local;

pub use assets::AssetStore;
pub use local::LocalRoot;
