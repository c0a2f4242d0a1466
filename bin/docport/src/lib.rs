//! Docport CLI Library
//!
//! Builds product documentation into a versioned content store and serves
//! it to the portal shell, either from the store (BFF) or live from a
//! product's working tree (preview).
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, serve, preview, check)
//! - [`server`] - HTTP router shared by the BFF and the preview server
//! - [`routes`] - Request path classification
//! - [`backend`] - Store and preview data sources
//! - [`preview`] - Live single-product backend
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use docport::{Config, cmd};
//!
//! let config = Config::default();
//! cmd::build::run(&config, Path::new("products/s3")).unwrap();
//! ```

pub mod backend;
pub mod cmd;
pub mod preview;
pub mod routes;
pub mod server;

// Re-export core types for convenience
pub use docport_core::{Config, ProductMetadata, RoutePath};
pub use docport_store::{BuildStats, Catalog, ContentResolver, ProductBuilder};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
