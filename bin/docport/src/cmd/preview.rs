//! Preview command - serve one product live from its working tree

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use color_eyre::eyre::{Result, WrapErr};
use docport_core::{Config, METADATA_FILE};
use docport_render::converter_for;
use docport_store::SOURCE_DIR;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind};
use tokio::sync::mpsc;

use crate::{
    preview::PreviewSite,
    server::{AppState, ServerState, create_router},
};

/// Debounce interval for file changes.
const DEBOUNCE_MS: u64 = 200;

/// Run the preview command.
///
/// Serves the product at `product_dir` through the same API as the BFF,
/// converting pages on request and pushing reloads when files change.
pub async fn run(config: &Config, product_dir: &Path, open_browser: bool) -> Result<()> {
    tracing::info!(product = %product_dir.display(), port = config.preview.port, "Starting preview");

    let converter = converter_for(&config.render);
    let site = PreviewSite::open(product_dir, converter).wrap_err_with(|| {
        format!(
            "docs.yaml not found or invalid in {}",
            product_dir.display()
        )
    })?;
    let url_prefix = site.route().url_prefix();
    let links = site.links();
    let watched = Watched::new(product_dir, &config.server.shell_dir);

    let mut state = AppState::new(Arc::new(site), &config.server.shell_dir);

    // Keep watcher alive for the lifetime of the server
    let _watcher = if config.preview.watch {
        let reload = Arc::new(ServerState::new());
        let watcher = spawn_watcher(watched, reload.clone())?;
        state = state.with_reload(reload);
        Some(watcher)
    } else {
        None
    };

    let app = create_router(state);
    let addr = config
        .bind_addr(config.preview.port)
        .wrap_err("Invalid listen address")?;
    let listener = super::bind(addr).await?;

    let url = format!("http://{addr}{url_prefix}");
    println!();
    println!("  Preview running at {url}");
    for (label, href) in &links {
        println!("    {label:<24} http://{addr}{href}");
    }
    println!("  Press Ctrl+C to stop");
    println!();

    if open_browser && let Err(e) = open::that(&url) {
        tracing::warn!(error = %e, "Failed to open browser");
    }

    axum::serve(listener, app).await.wrap_err("Server error")?;

    Ok(())
}

/// Files whose changes trigger a reload.
///
/// The product directory itself is watched non-recursively so that
/// `docs.yaml` stays watched when an editor saves by replacing the file.
#[derive(Debug, Clone)]
struct Watched {
    product_dir: PathBuf,
    source_dir: PathBuf,
    shell_dir: PathBuf,
}

impl Watched {
    fn new(product_dir: &Path, shell_dir: &Path) -> Self {
        // notify reports absolute paths; compare against the same form.
        let absolute = |p: &Path| std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
        let product_dir = absolute(product_dir);
        Self {
            source_dir: product_dir.join(SOURCE_DIR),
            shell_dir: absolute(shell_dir),
            product_dir,
        }
    }

    fn roots(&self) -> [(&Path, RecursiveMode); 3] {
        [
            (self.product_dir.as_path(), RecursiveMode::NonRecursive),
            (self.source_dir.as_path(), RecursiveMode::Recursive),
            (self.shell_dir.as_path(), RecursiveMode::Recursive),
        ]
    }

    /// Whether a change to `path` should reload the browser.
    fn triggers(&self, path: &Path) -> bool {
        if path.starts_with(&self.source_dir) || path.starts_with(&self.shell_dir) {
            return true;
        }
        path.parent() == Some(self.product_dir.as_path())
            && path.file_name().is_some_and(|name| name == METADATA_FILE)
    }
}

/// Watch the preview's files and notify browsers after each burst of changes.
fn spawn_watcher(watched: Watched, reload: Arc<ServerState>) -> Result<RecommendedWatcher> {
    let (tx, mut rx) = mpsc::channel::<()>(16);
    let filter = watched.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res
                && matches!(
                    event.kind,
                    EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_))
                        | EventKind::Create(_)
                        | EventKind::Remove(_)
                )
                && event.paths.iter().any(|p| filter.triggers(p))
            {
                let _ = tx.try_send(());
            }
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    for (path, mode) in watched.roots() {
        if path.exists() {
            watcher
                .watch(path, mode)
                .wrap_err_with(|| format!("Failed to watch {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Watching");
        }
    }

    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Debounce, then drain any queued events
            tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS)).await;
            while rx.try_recv().is_ok() {}

            println!("  File change detected, reloading...");
            reload.notify_reload();
        }
    });

    Ok(watcher)
}
