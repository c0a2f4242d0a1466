//! docport Store Library
//!
//! Everything that touches the published content store.
//!
//! # Modules
//!
//! - [`catalog`] - Store walking and catalog grouping
//! - [`resolver`] - Content and metadata lookup for a route
//! - [`build`] - Product build and publication

pub mod build;
pub mod catalog;
pub mod resolver;

pub use build::{BuildError, BuildStats, ProductBuilder, SOURCE_DIR};
pub use catalog::{Catalog, Duplicate, ProductSummary, ScanReport, Skipped, scan, scan_with_report};
pub use resolver::{Artifact, ContentResolver, FRAGMENT_EXTENSION};
