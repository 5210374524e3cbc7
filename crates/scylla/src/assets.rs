//! Built-in UI asset bundle.
//!
//! The server's own static resources, embedded at compile time and
//! bound at `/lib/docs` so they shadow anything the toolchain root
//! happens to keep at the same path.

use scylla_vfs::AssetStore;

/// Build the embedded bundle.
pub fn builtin() -> AssetStore {
    AssetStore::new([
        ("index.html", include_str!("../assets/index.html")),
        ("css/style.css", include_str!("../assets/style.css")),
        ("js/site.js", include_str!("../assets/site.js")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use scylla_vfs::FileSystem;
    use std::path::Path;

    #[tokio::test]
    async fn test_bundle_is_complete() {
        let bundle = builtin();
        assert_eq!(bundle.len(), 3);
        assert!(bundle.exists(Path::new("index.html")).await);
        assert!(bundle.exists(Path::new("css/style.css")).await);
    }
}
