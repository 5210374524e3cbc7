//! End-to-end overlay tests against real directories, wired the way
//! the server binds its namespace at startup: toolchain root at `/`
//! (Replace), UI bundle at `/lib/docs` (Replace), workspace roots at
//! `/src` (After).

use std::path::Path;
use std::sync::Arc;

use scylla_vfs::{AccessGate, AssetStore, BindMode, FileSystem, LocalRoot, Namespace, VfsError};
use tempfile::TempDir;

struct Fixture {
    ns: Arc<Namespace>,
    _toolchain: TempDir,
    _workspace: TempDir,
}

fn write(dir: &TempDir, rel: &str, contents: &str) {
    let path = dir.path().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

async fn standard_namespace() -> Fixture {
    let toolchain = TempDir::new().unwrap();
    write(&toolchain, "lib/docs/index.html", "toolchain copy");
    write(&toolchain, "src/fmt/doc.txt", "toolchain fmt docs");
    write(&toolchain, "doc/spec.html", "language spec");

    let workspace = TempDir::new().unwrap();
    write(&workspace, "fmt/doc.txt", "workspace fmt docs");
    write(&workspace, "mylib/doc.txt", "workspace mylib docs");

    let gate = AccessGate::default();
    let ns = Arc::new(Namespace::new());
    ns.bind(
        "/",
        Arc::new(LocalRoot::new(toolchain.path(), gate.clone())),
        BindMode::Replace,
    )
    .await
    .unwrap();
    ns.bind(
        "/lib/docs",
        Arc::new(AssetStore::new([
            ("index.html", "bundle copy"),
            ("css/style.css", "body {}"),
        ])),
        BindMode::Replace,
    )
    .await
    .unwrap();
    ns.bind(
        "/src",
        Arc::new(LocalRoot::new(workspace.path(), gate.clone())),
        BindMode::After,
    )
    .await
    .unwrap();

    Fixture {
        ns,
        _toolchain: toolchain,
        _workspace: workspace,
    }
}

#[tokio::test]
async fn bundle_shadows_toolchain_under_lib_docs() {
    let fx = standard_namespace().await;

    let data = fx.ns.read_all(Path::new("/lib/docs/index.html")).await.unwrap();
    assert_eq!(data, b"bundle copy");

    // Assets only the bundle has.
    let data = fx.ns.read_all(Path::new("/lib/docs/css/style.css")).await.unwrap();
    assert_eq!(data, b"body {}");
}

#[tokio::test]
async fn toolchain_wins_over_workspace_under_src() {
    let fx = standard_namespace().await;

    let data = fx.ns.read_all(Path::new("/src/fmt/doc.txt")).await.unwrap();
    assert_eq!(data, b"toolchain fmt docs");

    // Falls back to the workspace only where the toolchain has nothing.
    let data = fx.ns.read_all(Path::new("/src/mylib/doc.txt")).await.unwrap();
    assert_eq!(data, b"workspace mylib docs");
}

#[tokio::test]
async fn src_listing_merges_both_roots() {
    let fx = standard_namespace().await;

    let entries = fx.ns.read_dir(Path::new("/src")).await.unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["fmt", "mylib"]);
}

#[tokio::test]
async fn walk_visits_every_file_once() {
    let fx = standard_namespace().await;

    // The indexer contract: recurse over read_dir, treat NotFound as
    // skip, read every file through the resolver.
    async fn walk(ns: &Arc<Namespace>, path: String, files: &mut Vec<String>) {
        let entries = match ns.read_dir(Path::new(&path)).await {
            Ok(entries) => entries,
            Err(VfsError::NotFound(_)) => return,
            Err(e) => panic!("walk failed at {path}: {e}"),
        };
        for entry in entries {
            let child = if path == "/" {
                format!("/{}", entry.name)
            } else {
                format!("{}/{}", path, entry.name)
            };
            if entry.kind.is_dir() {
                Box::pin(walk(ns, child, files)).await;
            } else {
                assert!(ns.read_all(Path::new(&child)).await.is_ok());
                files.push(child);
            }
        }
    }

    let mut files = Vec::new();
    Box::pin(walk(&fx.ns, "/".to_string(), &mut files)).await;
    files.sort();
    assert_eq!(
        files,
        vec![
            "/doc/spec.html",
            "/lib/docs/css/style.css",
            "/lib/docs/index.html",
            "/src/fmt/doc.txt",
            "/src/mylib/doc.txt",
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn fifty_concurrent_opens_complete_at_capacity_twenty() {
    let toolchain = TempDir::new().unwrap();
    write(&toolchain, "doc.txt", "contents");

    let gate = AccessGate::new(20);
    let ns = Arc::new(Namespace::new());
    ns.bind(
        "/",
        Arc::new(LocalRoot::new(toolchain.path(), gate.clone())),
        BindMode::Replace,
    )
    .await
    .unwrap();

    let tasks = (0..50).map(|_| {
        let ns = Arc::clone(&ns);
        tokio::spawn(async move { ns.read_all(Path::new("/doc.txt")).await })
    });

    for result in futures::future::join_all(tasks).await {
        assert_eq!(result.unwrap().unwrap(), b"contents");
    }
    assert_eq!(gate.available(), 20);
}

#[tokio::test]
async fn missing_page_is_not_found() {
    let fx = standard_namespace().await;
    let err = fx.ns.open(Path::new("/pkg/nonexistent")).await.err().unwrap();
    assert!(err.is_not_found());
}
