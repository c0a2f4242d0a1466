//! Catalog scanning.
//!
//! Walks the content store and groups every published product into a
//! domain -> system -> products index. Entries are keyed by the hierarchy the
//! metadata declares, never by where the file happened to be found.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use docport_core::{METADATA_FILE, ProductMetadata, RoutePath, route};
use rayon::prelude::*;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Catalog entry for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub path: RoutePath,
}

impl ProductSummary {
    /// Summarize a product whose route has already been resolved.
    pub fn new(meta: &ProductMetadata, path: RoutePath) -> Self {
        Self {
            id: meta.id.clone(),
            title: meta.title.clone(),
            description: meta.description.clone(),
            path,
        }
    }
}

/// domain -> system -> products.
///
/// Domains, systems and products all keep the order in which the scan first
/// met them. Equality ignores that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog(IndexMap<String, IndexMap<String, Vec<ProductSummary>>>);

impl Catalog {
    /// Append a product under its route's domain and system.
    pub fn insert(&mut self, summary: ProductSummary) {
        self.0
            .entry(summary.path.domain().to_string())
            .or_default()
            .entry(summary.path.system().to_string())
            .or_default()
            .push(summary);
    }

    /// Catalog holding exactly one product.
    pub fn single(summary: ProductSummary) -> Self {
        let mut catalog = Self::default();
        catalog.insert(summary);
        catalog
    }

    /// Products declared under `domain`/`system`.
    pub fn products(&self, domain: &str, system: &str) -> &[ProductSummary] {
        self.0
            .get(domain)
            .and_then(|systems| systems.get(system))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterate over every product entry.
    pub fn iter(&self) -> impl Iterator<Item = &ProductSummary> {
        self.0.values().flat_map(|s| s.values()).flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Two or more metadata documents declaring the same route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub route: RoutePath,
    /// Metadata files declaring it, in discovery order.
    pub sources: Vec<PathBuf>,
}

/// A metadata document that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a full scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Every valid product, duplicates included.
    pub catalog: Catalog,
    pub duplicates: Vec<Duplicate>,
    pub skipped: Vec<Skipped>,
}

/// Scan the store and return only the catalog.
pub fn scan(store_root: &Path) -> Catalog {
    scan_with_report(store_root).catalog
}

/// Scan the store, reporting duplicates and unusable documents alongside the catalog.
///
/// A missing or unreadable root yields an empty report. A malformed document
/// is logged and skipped; it never fails the scan.
pub fn scan_with_report(store_root: &Path) -> ScanReport {
    let files = find_metadata_files(store_root);
    debug!(root = %store_root.display(), count = files.len(), "found metadata documents");

    // Parse in parallel; `collect` keeps traversal order.
    let parsed: Vec<_> = files
        .par_iter()
        .map(|path| (path, load_entry(store_root, path)))
        .collect();

    let mut report = ScanReport::default();
    let mut seen: HashMap<RoutePath, Vec<PathBuf>> = HashMap::new();
    let mut order: Vec<RoutePath> = Vec::new();

    for (path, entry) in parsed {
        match entry {
            Ok((meta, route)) => {
                let sources = seen.entry(route.clone()).or_default();
                if sources.is_empty() {
                    order.push(route.clone());
                }
                sources.push(path.clone());
                report.catalog.insert(ProductSummary::new(&meta, route));
            }
            Err(reason) => {
                warn!(path = %path.display(), error = %reason, "skipping metadata document");
                report.skipped.push(Skipped {
                    path: path.clone(),
                    reason,
                });
            }
        }
    }

    for route in order {
        if let Some(sources) = seen.remove(&route)
            && sources.len() > 1
        {
            warn!(%route, count = sources.len(), "route declared by more than one product");
            report.duplicates.push(Duplicate { route, sources });
        }
    }

    info!(
        products = report.catalog.len(),
        skipped = report.skipped.len(),
        duplicates = report.duplicates.len(),
        "catalog scan complete"
    );
    report
}

/// Every `docs.yaml` below `root`, in file-name order, skipping hidden directories.
fn find_metadata_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "unreadable store entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && e.file_name() == METADATA_FILE)
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn load_entry(
    store_root: &Path,
    path: &Path,
) -> std::result::Result<(ProductMetadata, RoutePath), String> {
    let meta = ProductMetadata::load(path).map_err(|e| e.to_string())?;
    let route = route::resolve_at(&meta, path).map_err(|e| e.to_string())?;

    let expected = route.dir_in(store_root);
    if path.parent() != Some(expected.as_path()) {
        warn!(
            path = %path.display(),
            %route,
            "metadata found outside its declared route; cataloguing by declared route"
        );
    }

    Ok((meta, route))
}
