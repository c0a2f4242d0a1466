//! docport Core Library
//!
//! Product metadata, hierarchy routing, request path sanitizing and
//! configuration shared by the build pipeline, the BFF and the preview server.

pub mod config;
pub mod error;
pub mod metadata;
pub mod route;
pub mod sanitize;

pub use config::{Config, Engine};
pub use error::{CoreError, Result};
pub use metadata::{Hierarchy, METADATA_FILE, NavItem, ProductMetadata};
pub use route::{RoutePath, VERSION, resolve};
pub use sanitize::{DEFAULT_PAGE, sanitize};
