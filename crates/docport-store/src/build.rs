//! Product build orchestration.
//!
//! Converts a product's sources and publishes them, together with a verbatim
//! copy of its metadata, under the product's route directory in the store.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use docport_core::{CoreError, METADATA_FILE, ProductMetadata, RoutePath, route};
use docport_render::{Converter, RenderError};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::resolver::FRAGMENT_EXTENSION;

/// Directory below the product root holding source documents.
pub const SOURCE_DIR: &str = "src";

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Metadata missing or invalid.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// One source document failed to convert; nothing was published.
    #[error("conversion failed for {path}: {source}")]
    ConversionFailure {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone)]
pub struct BuildStats {
    /// Where the product was published.
    pub route: RoutePath,

    /// Output directory in the store.
    pub output_dir: PathBuf,

    /// Number of fragments written.
    pub pages: usize,

    /// Files in `src/` the engine does not read, e.g. `.md` under asciidoctor.
    pub ignored: Vec<PathBuf>,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Builds one product into the content store.
pub struct ProductBuilder<'a> {
    product_dir: PathBuf,
    store_root: PathBuf,
    converter: &'a dyn Converter,
}

impl<'a> ProductBuilder<'a> {
    /// Create a new builder.
    #[must_use]
    pub fn new(
        product_dir: impl Into<PathBuf>,
        store_root: impl Into<PathBuf>,
        converter: &'a dyn Converter,
    ) -> Self {
        Self {
            product_dir: product_dir.into(),
            store_root: store_root.into(),
            converter,
        }
    }

    /// Path of the product's metadata document.
    pub fn metadata_path(&self) -> PathBuf {
        self.product_dir.join(METADATA_FILE)
    }

    /// Load metadata and resolve the route without writing anything.
    pub fn plan(&self) -> Result<(ProductMetadata, RoutePath)> {
        let path = self.metadata_path();
        let meta = ProductMetadata::load(&path)?;
        let route = route::resolve_at(&meta, &path)?;
        Ok((meta, route))
    }

    /// Execute the full build.
    ///
    /// Every source is converted before anything is written, so any failure
    /// leaves the previously published version untouched.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();

        info!(
            product = %self.product_dir.display(),
            store = %self.store_root.display(),
            "starting build"
        );

        // 1. Metadata and route
        let (meta, route) = self.plan()?;
        let output_dir = route.dir_in(&self.store_root);
        info!(id = %meta.id, %route, output = %output_dir.display(), "resolved output directory");

        // 2. Convert every source in memory
        let (sources, ignored) = self.list_sources()?;
        if !ignored.is_empty() {
            warn!(
                count = ignored.len(),
                files = ?ignored,
                extension = self.converter.source_extension(),
                "source files not read by the selected engine"
            );
        }
        let fragments = sources
            .par_iter()
            .map(|path| self.convert_one(path))
            .collect::<Result<Vec<_>>>()?;

        // 3. Replace the previous publication of this route
        clean_dir(&output_dir)?;
        for (page, html) in &fragments {
            let dest = output_dir.join(format!("{page}.{FRAGMENT_EXTENSION}"));
            fs::write(&dest, html)?;
            debug!(path = %dest.display(), "wrote fragment");
        }

        // 4. Publish metadata verbatim
        fs::copy(self.metadata_path(), output_dir.join(METADATA_FILE))?;
        debug!("copied {METADATA_FILE}");

        let stats = BuildStats {
            route,
            output_dir,
            pages: fragments.len(),
            ignored,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            pages = stats.pages,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Source documents for this engine directly inside `src/`, in file-name order.
    pub fn find_sources(&self) -> Result<Vec<PathBuf>> {
        Ok(self.list_sources()?.0)
    }

    /// Top-level files of `src/`, split into engine sources and ignored files.
    fn list_sources(&self) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        let src_dir = self.product_dir.join(SOURCE_DIR);
        if !src_dir.is_dir() {
            warn!(dir = %src_dir.display(), "no source directory found");
            return Ok((Vec::new(), Vec::new()));
        }

        let mut sources = Vec::new();
        let mut ignored = Vec::new();
        for entry in fs::read_dir(&src_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if self.converter.accepts(&path) {
                sources.push(path);
            } else {
                ignored.push(path);
            }
        }
        sources.sort();
        ignored.sort();
        Ok((sources, ignored))
    }

    fn convert_one(&self, path: &Path) -> Result<(String, String)> {
        let page = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!(file = %path.display(), "converting");
        let source = fs::read_to_string(path)?;
        let html = self
            .converter
            .convert(&source, path)
            .map_err(|source| BuildError::ConversionFailure {
                path: path.to_path_buf(),
                source,
            })?;

        Ok((page, html))
    }
}

/// Empty `dir` (creating it if needed). Only ever called on a route directory.
fn clean_dir(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        debug!(dir = %dir.display(), "removing previous publication");
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

#[cfg(test)]
mod tests {
    use docport_render::MarkdownConverter;

    use super::*;

    const DOCS: &str = "id: s3-docs\ntitle: S3\nhierarchy:\n  domain: infrastructure\n  system: cloud\n  product: S3\nnavigation:\n  - label: Intro\n    url: /intro\n";

    /// Converter that fails on any source containing `FAIL`.
    struct Picky;

    impl Converter for Picky {
        fn source_extension(&self) -> &'static str {
            "md"
        }

        fn convert(&self, source: &str, path: &Path) -> docport_render::Result<String> {
            if source.contains("FAIL") {
                Err(RenderError::failed(path, "refused"))
            } else {
                Ok(format!("<p>{source}</p>"))
            }
        }
    }

    fn product(docs: &str, sources: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join(METADATA_FILE), docs).expect("write");
        fs::create_dir_all(dir.path().join(SOURCE_DIR)).expect("create dir");
        for (name, body) in sources {
            fs::write(dir.path().join(SOURCE_DIR).join(name), body).expect("write");
        }
        dir
    }

    #[test]
    fn test_build_writes_route_dir() {
        let product = product(DOCS, &[("intro.md", "# Intro"), ("notes.txt", "skip")]);
        let store = tempfile::tempdir().expect("create temp dir");
        let converter = MarkdownConverter::new();

        let stats = ProductBuilder::new(product.path(), store.path(), &converter)
            .build()
            .expect("build");

        let out = store.path().join("infrastructure/cloud/S3/v1");
        assert_eq!(stats.route.to_string(), "infrastructure/cloud/S3/v1");
        assert_eq!(stats.output_dir, out);
        assert_eq!(stats.pages, 1);
        assert!(fs::read_to_string(out.join("intro.html")).unwrap().contains("<h1>Intro</h1>"));
        assert!(!out.join("notes.html").exists());
        assert_eq!(stats.ignored, [product.path().join("src/notes.txt")]);
        assert_eq!(fs::read_to_string(out.join(METADATA_FILE)).unwrap(), DOCS);
    }

    #[test]
    fn test_missing_metadata_fails() {
        let product = tempfile::tempdir().expect("create temp dir");
        let store = tempfile::tempdir().expect("create temp dir");
        let err = ProductBuilder::new(product.path(), store.path(), &Picky)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::Core(CoreError::NotFound(_))));
    }

    #[test]
    fn test_missing_domain_fails_before_writing() {
        let docs = "id: x\ntitle: X\nhierarchy:\n  system: cloud\n  product: S3\n";
        let product = product(docs, &[("intro.md", "hi")]);
        let store = tempfile::tempdir().expect("create temp dir");

        let err = ProductBuilder::new(product.path(), store.path(), &Picky)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::Core(CoreError::MalformedHierarchy { .. })));
        assert_eq!(fs::read_dir(store.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_conversion_failure_aborts_and_keeps_previous() {
        let product = product(DOCS, &[("intro.md", "hello")]);
        let store = tempfile::tempdir().expect("create temp dir");
        ProductBuilder::new(product.path(), store.path(), &Picky)
            .build()
            .expect("first build");

        fs::write(product.path().join("src/broken.md"), "FAIL").expect("write");
        let err = ProductBuilder::new(product.path(), store.path(), &Picky)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::ConversionFailure { .. }));

        let out = store.path().join("infrastructure/cloud/S3/v1");
        assert_eq!(fs::read_to_string(out.join("intro.html")).unwrap(), "<p>hello</p>");
        assert!(!out.join("broken.html").exists());
    }

    #[test]
    fn test_stale_pages_removed() {
        let product = product(DOCS, &[("intro.md", "a"), ("old.md", "b")]);
        let store = tempfile::tempdir().expect("create temp dir");
        ProductBuilder::new(product.path(), store.path(), &Picky)
            .build()
            .expect("build");

        fs::remove_file(product.path().join("src/old.md")).expect("remove");
        ProductBuilder::new(product.path(), store.path(), &Picky)
            .build()
            .expect("rebuild");

        let out = store.path().join("infrastructure/cloud/S3/v1");
        assert!(out.join("intro.html").exists());
        assert!(!out.join("old.html").exists());
    }

    #[test]
    fn test_missing_src_still_publishes_metadata() {
        let product = tempfile::tempdir().expect("create temp dir");
        fs::write(product.path().join(METADATA_FILE), DOCS).expect("write");
        let store = tempfile::tempdir().expect("create temp dir");

        let stats = ProductBuilder::new(product.path(), store.path(), &Picky)
            .build()
            .expect("build");
        assert_eq!(stats.pages, 0);
        assert!(stats.output_dir.join(METADATA_FILE).exists());
    }

    #[test]
    fn test_sources_sorted() {
        let product = product(DOCS, &[("b.md", ""), ("a.md", ""), ("c.adoc", "")]);
        let store = tempfile::tempdir().expect("create temp dir");
        let builder = ProductBuilder::new(product.path(), store.path(), &Picky);
        let names: Vec<_> = builder
            .find_sources()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.md", "b.md"]);
    }
}
