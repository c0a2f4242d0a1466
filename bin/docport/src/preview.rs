//! Single-product backend for local previews.
//!
//! Emulates the store API for the product in the working tree: the catalog
//! holds only this product, metadata is re-read on every request, and pages
//! are converted from source on demand.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use docport_core::{METADATA_FILE, ProductMetadata, RoutePath, route, sanitize};
use docport_render::Converter;
use docport_store::{Artifact, Catalog, FRAGMENT_EXTENSION, ProductSummary, SOURCE_DIR};

use crate::backend::{ApiError, DocsBackend, Resource};

/// The product being previewed.
pub struct PreviewSite {
    product_dir: PathBuf,
    route: RoutePath,
    meta: ProductMetadata,
    converter: Box<dyn Converter>,
}

impl PreviewSite {
    /// Load the product at `product_dir`.
    ///
    /// Fails when `docs.yaml` is missing, unparsable, or has no usable hierarchy.
    pub fn open(
        product_dir: impl Into<PathBuf>,
        converter: Box<dyn Converter>,
    ) -> docport_core::Result<Self> {
        let product_dir = product_dir.into();
        let docs = product_dir.join(METADATA_FILE);
        let meta = ProductMetadata::load(&docs)?;
        let route = route::resolve_at(&meta, &docs)?;

        tracing::info!(%route, id = %meta.id, "previewing product");
        Ok(Self {
            product_dir,
            route,
            meta,
            converter,
        })
    }

    /// Route path fixed at startup.
    pub fn route(&self) -> &RoutePath {
        &self.route
    }

    /// Navigation entries as portal links, e.g. `/docs/infrastructure/cloud/S3/v1/intro`.
    pub fn links(&self) -> Vec<(String, String)> {
        self.meta
            .navigation
            .iter()
            .map(|item| (item.label.clone(), self.route.nav_href(&item.url)))
            .collect()
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.product_dir.join(METADATA_FILE)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.product_dir.join(SOURCE_DIR)
    }

    fn is_mine(&self, route: &str) -> bool {
        route.trim_matches('/') == self.route.to_string()
    }

    /// Source document for `page`, e.g. `intro` -> `src/intro.md`.
    fn source_for(&self, page: &str) -> docport_core::Result<PathBuf> {
        let page = page
            .strip_suffix(&format!(".{FRAGMENT_EXTENSION}"))
            .unwrap_or(page);
        let path = sanitize(&self.source_dir(), page)?;
        let mut file = path.into_os_string();
        file.push(".");
        file.push(self.converter.source_extension());
        Ok(PathBuf::from(file))
    }
}

impl DocsBackend for PreviewSite {
    fn catalog(&self) -> Catalog {
        let mut summary = ProductSummary::new(&self.meta, self.route.clone());
        summary.description = Some(
            self.meta
                .description_or(|| format!("[Preview] {}", self.meta.title)),
        );
        Catalog::single(summary)
    }

    fn metadata(&self, route: &str) -> Result<ProductMetadata, ApiError> {
        if !self.is_mine(route) {
            return Err(ApiError::NotFound(Resource::Metadata));
        }
        ProductMetadata::load(&self.metadata_path())
            .map_err(|e| ApiError::from_core(Resource::Metadata, e))
    }

    fn content(&self, route: &str, page: &str) -> Result<Artifact, ApiError> {
        if !self.is_mine(route) {
            return Err(ApiError::NotFound(Resource::Content));
        }

        let path = self
            .source_for(page)
            .map_err(|e| ApiError::from_core(Resource::Content, e))?;
        let source = read_source(&path)?;
        let html = self.converter.convert(&source, &path)?;

        Ok(Artifact {
            page: page_name(&self.source_dir(), &path),
            html,
        })
    }
}

fn read_source(path: &Path) -> Result<String, ApiError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::IsADirectory => {
            ApiError::NotFound(Resource::Content)
        }
        _ => ApiError::from_core(Resource::Content, e.into()),
    })
}

fn page_name(src_dir: &Path, path: &Path) -> String {
    path.strip_prefix(src_dir)
        .unwrap_or(path)
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}
