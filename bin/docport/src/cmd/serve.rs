//! Serve command - the BFF over the published content store

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use docport_core::Config;
use tower_http::cors::CorsLayer;

use crate::{
    backend::StoreBackend,
    server::{AppState, create_router},
};

/// Run the serve command.
///
/// Answers catalog, metadata and content requests from `config.store.root`
/// and serves the portal shell for every other path.
pub async fn run(config: &Config) -> Result<()> {
    let store = &config.store.root;
    if !store.is_dir() {
        tracing::warn!(store = %store.display(), "content store does not exist yet; catalog will be empty");
    }

    let backend = Arc::new(StoreBackend::new(store));
    let state = AppState::new(backend, &config.server.shell_dir);
    let app = create_router(state).layer(CorsLayer::permissive());

    let addr = config
        .bind_addr(config.server.port)
        .wrap_err("Invalid listen address")?;
    let listener = super::bind(addr).await?;

    tracing::info!(%addr, store = %store.display(), "BFF listening");
    println!();
    println!("  Docs portal running at http://{addr}");
    println!("  Store: {}", store.display());
    println!("  Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app).await.wrap_err("Server error")?;

    Ok(())
}
