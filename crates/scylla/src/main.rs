//! scylla - browse merged documentation source trees.
//!
//! Binds a toolchain root, the built-in UI asset bundle, and any number
//! of workspace roots into one read-only virtual namespace, then
//! resolves paths against it:
//!
//! ```bash
//! scylla --toolchain-root /usr/local/toolchain ls /src
//! scylla --toolchain-root /usr/local/toolchain cat /lib/docs/index.html
//! scylla --toolchain-root ~/toolchain --workspace-root ~/work walk /src
//! ```
//!
//! The binding order is fixed: toolchain at `/` (Replace), asset bundle
//! at `/lib/docs` (Replace), each workspace root at `/src` (After).

mod assets;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use scylla_vfs::{AccessGate, BindMode, FileSystem, LocalRoot, Namespace, VfsError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scylla", about = "Browse merged documentation source trees")]
struct Cli {
    /// Toolchain root directory, bound at `/`.
    #[arg(long)]
    toolchain_root: PathBuf,

    /// Workspace root, bound at `/src` behind the toolchain. Repeatable.
    #[arg(long = "workspace-root")]
    workspace_roots: Vec<PathBuf>,

    /// Maximum simultaneous physical filesystem operations.
    #[arg(long, default_value_t = AccessGate::DEFAULT_CAPACITY)]
    fs_gate: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a directory in the merged namespace.
    Ls { path: String },
    /// Print a file from the merged namespace to stdout.
    Cat { path: String },
    /// Show metadata for a path.
    Stat { path: String },
    /// Recursively visit every file, the way the indexer does.
    Walk {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show the configured bindings in precedence-relevant order.
    Bindings,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ns = build_namespace(&cli).await?;

    match &cli.command {
        Command::Ls { path } => cmd_ls(&ns, path).await,
        Command::Cat { path } => cmd_cat(&ns, path).await,
        Command::Stat { path } => cmd_stat(&ns, path).await,
        Command::Walk { path } => cmd_walk(&ns, path).await,
        Command::Bindings => cmd_bindings(&ns).await,
    }
}

/// Construct the namespace in the fixed startup order.
async fn build_namespace(cli: &Cli) -> Result<Arc<Namespace>> {
    let gate = AccessGate::new(cli.fs_gate);
    let ns = Arc::new(Namespace::new());

    let toolchain = expand(&cli.toolchain_root);
    if !toolchain.is_dir() {
        bail!("toolchain root is not a directory: {}", toolchain.display());
    }
    tracing::info!(root = %toolchain.display(), "binding toolchain root at /");
    ns.bind(
        "/",
        Arc::new(LocalRoot::new(toolchain, gate.clone())),
        BindMode::Replace,
    )
    .await?;

    ns.bind("/lib/docs", Arc::new(assets::builtin()), BindMode::Replace)
        .await?;

    for root in &cli.workspace_roots {
        let root = expand(root);
        tracing::info!(root = %root.display(), "binding workspace root at /src");
        ns.bind(
            "/src",
            Arc::new(LocalRoot::new(root, gate.clone())),
            BindMode::After,
        )
        .await?;
    }

    Ok(ns)
}

fn expand(path: &Path) -> PathBuf {
    shellexpand::tilde(&path.to_string_lossy()).as_ref().into()
}

async fn cmd_ls(ns: &Arc<Namespace>, path: &str) -> Result<()> {
    let entries = ns
        .read_dir(Path::new(path))
        .await
        .with_context(|| format!("listing {path}"))?;

    for entry in entries {
        let kind = if entry.kind.is_dir() { 'd' } else { '-' };
        let size = entry
            .size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let modified = entry
            .modified
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());
        println!("{kind} {size:>10} {modified:>8} {}", entry.name);
    }
    Ok(())
}

async fn cmd_cat(ns: &Arc<Namespace>, path: &str) -> Result<()> {
    let mut reader = ns
        .open(Path::new(path))
        .await
        .with_context(|| format!("opening {path}"))?;
    let mut stdout = tokio::io::stdout();
    tokio::io::copy(&mut reader, &mut stdout).await?;
    Ok(())
}

async fn cmd_stat(ns: &Arc<Namespace>, path: &str) -> Result<()> {
    let meta = ns
        .stat(Path::new(path))
        .await
        .with_context(|| format!("stat {path}"))?;

    println!("path:     {path}");
    println!("kind:     {}", if meta.is_dir() { "directory" } else { "file" });
    println!("size:     {}", meta.size);
    println!(
        "modified: {}",
        meta.modified
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string())
    );
    Ok(())
}

/// Walk the namespace the way the documentation indexer does: NotFound
/// is a skip, any other error is fatal for that subtree.
async fn cmd_walk(ns: &Arc<Namespace>, path: &str) -> Result<()> {
    let mut files = 0u64;
    let mut failed = 0u64;
    walk(ns, path.to_string(), &mut files, &mut failed).await;
    println!("{files} files");
    if failed > 0 {
        bail!("{failed} subtree(s) could not be walked");
    }
    Ok(())
}

async fn walk(ns: &Arc<Namespace>, path: String, files: &mut u64, failed: &mut u64) {
    let entries = match ns.read_dir(Path::new(&path)).await {
        Ok(entries) => entries,
        Err(VfsError::NotFound(_)) => return,
        Err(e) => {
            tracing::error!(%path, error = %e, "subtree not walkable");
            *failed += 1;
            return;
        }
    };

    for entry in entries {
        let child = if path == "/" {
            format!("/{}", entry.name)
        } else {
            format!("{}/{}", path, entry.name)
        };
        if entry.kind.is_dir() {
            Box::pin(walk(ns, child, files, failed)).await;
        } else {
            println!("{child}");
            *files += 1;
        }
    }
}

async fn cmd_bindings(ns: &Arc<Namespace>) -> Result<()> {
    println!("{:<12} {:>4} MOUNTPOINT", "MODE", "SEQ");
    for binding in ns.bindings().await {
        println!(
            "{:<12} {:>4} {}",
            format!("{:?}", binding.mode),
            binding.seq,
            binding.mountpoint
        );
    }
    Ok(())
}

/// Format a modification time relative to now.
fn format_timestamp(time: SystemTime) -> String {
    match SystemTime::now().duration_since(time) {
        Ok(elapsed) => {
            let secs = elapsed.as_secs();
            if secs < 60 {
                format!("{secs}s ago")
            } else if secs < 3600 {
                format!("{}m ago", secs / 60)
            } else if secs < 86400 {
                format!("{}h ago", secs / 3600)
            } else {
                format!("{}d ago", secs / 86400)
            }
        }
        Err(_) => "in the future".to_string(),
    }
}
