//! Content and metadata lookup against the published store.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use docport_core::{CoreError, METADATA_FILE, ProductMetadata, Result, RoutePath, sanitize};
use tracing::debug;

/// Extension of published fragments.
pub const FRAGMENT_EXTENSION: &str = "html";

/// A compiled HTML fragment and the page it was compiled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub page: String,
    pub html: String,
}

/// Resolves `{route}/{page}` lookups below a store root.
///
/// Stateless: every call reads the store as it is at that moment.
#[derive(Debug, Clone)]
pub struct ContentResolver {
    root: PathBuf,
}

impl ContentResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the fragment for `page` of the product at `route`.
    ///
    /// `.html` is appended when the page has no extension; an empty page is
    /// the default landing page. Escaping the product directory fails with
    /// [`CoreError::PathTraversal`].
    pub fn resolve_content(&self, route: &str, page: &str) -> Result<Artifact> {
        let dir = self.product_dir(route)?;
        let mut path = sanitize(&dir, page)?;
        if path.extension().is_none() {
            path.set_extension(FRAGMENT_EXTENSION);
        }
        debug!(route, page, path = %path.display(), "resolving content");

        let html = read_existing(&path, || format!("content {route}/{page}"))?;
        Ok(Artifact {
            page: page_id(&dir, &path),
            html,
        })
    }

    /// Read and parse the metadata document of the product at `route`.
    pub fn resolve_metadata(&self, route: &str) -> Result<ProductMetadata> {
        let dir = self.product_dir(route)?;
        let path = sanitize(&dir, METADATA_FILE)?;
        debug!(route, path = %path.display(), "resolving metadata");

        let text = read_existing(&path, || format!("metadata {route}"))?;
        ProductMetadata::from_yaml(&text, &path)
    }

    fn product_dir(&self, route: &str) -> Result<PathBuf> {
        let route = RoutePath::parse(route)
            .ok_or_else(|| CoreError::not_found(format!("route {route}")))?;
        // Segments are already validated; sanitizing keeps the single code path.
        sanitize(&self.root, &route.to_string())
    }
}

fn read_existing(path: &Path, what: impl FnOnce() -> String) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::IsADirectory) => {
            Err(CoreError::not_found(what()))
        }
        Err(e) if path.is_dir() => {
            debug!(error = %e, "lookup hit a directory");
            Err(CoreError::not_found(what()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Page identifier relative to the product directory, without extension.
fn page_id(dir: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(dir).unwrap_or(path).with_extension("");
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCS: &str = "id: s3-docs\ntitle: S3\nhierarchy:\n  domain: infrastructure\n  system: cloud\n  product: S3\nnavigation:\n  - label: Intro\n    url: /intro\n";

    fn store() -> (tempfile::TempDir, ContentResolver) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let product = dir.path().join("infrastructure/cloud/S3/v1");
        fs::create_dir_all(product.join("guides")).expect("create dir");
        fs::write(product.join("intro.html"), "<h1>Intro</h1>").expect("write");
        fs::write(product.join("guides/setup.html"), "<p>setup</p>").expect("write");
        fs::write(product.join(METADATA_FILE), DOCS).expect("write");
        fs::write(dir.path().join("secret.html"), "top secret").expect("write");
        let resolver = ContentResolver::new(dir.path());
        (dir, resolver)
    }

    const ROUTE: &str = "infrastructure/cloud/S3/v1";

    #[test]
    fn test_resolve_content() {
        let (_dir, resolver) = store();
        let artifact = resolver.resolve_content(ROUTE, "intro").unwrap();
        assert_eq!(artifact.html, "<h1>Intro</h1>");
        assert_eq!(artifact.page, "intro");
    }

    #[test]
    fn test_explicit_extension_kept() {
        let (_dir, resolver) = store();
        let artifact = resolver.resolve_content(ROUTE, "intro.html").unwrap();
        assert_eq!(artifact.html, "<h1>Intro</h1>");
    }

    #[test]
    fn test_nested_page() {
        let (_dir, resolver) = store();
        let artifact = resolver.resolve_content(ROUTE, "guides/setup").unwrap();
        assert_eq!(artifact.page, "guides/setup");
    }

    #[test]
    fn test_empty_page_is_default() {
        let (_dir, resolver) = store();
        let artifact = resolver.resolve_content(ROUTE, "").unwrap();
        assert_eq!(artifact.page, "intro");
    }

    #[test]
    fn test_missing_page_not_found() {
        let (_dir, resolver) = store();
        let err = resolver.resolve_content(ROUTE, "nope").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_directory_page_not_found() {
        let (dir, resolver) = store();
        fs::create_dir_all(dir.path().join(ROUTE).join("archive.html")).expect("create dir");
        let err = resolver.resolve_content(ROUTE, "archive.html").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, resolver) = store();
        for page in ["../../../../secret", "../../../etc/passwd", "../v1/../../x"] {
            let err = resolver.resolve_content(ROUTE, page).unwrap_err();
            assert!(matches!(err, CoreError::PathTraversal(_)), "{page}");
        }
    }

    #[test]
    fn test_bad_route_not_found() {
        let (_dir, resolver) = store();
        for route in ["infrastructure/cloud/S3", "../cloud/S3/v1", "a/b/c/d/e"] {
            let err = resolver.resolve_content(route, "intro").unwrap_err();
            assert!(err.is_not_found(), "{route}");
        }
    }

    #[test]
    fn test_resolve_metadata() {
        let (_dir, resolver) = store();
        let meta = resolver.resolve_metadata(ROUTE).unwrap();
        assert_eq!(meta.id, "s3-docs");
        assert_eq!(meta.navigation[0].url, "/intro");
    }

    #[test]
    fn test_metadata_not_found() {
        let (_dir, resolver) = store();
        let err = resolver.resolve_metadata("infrastructure/cloud/EC2/v1").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_malformed_metadata() {
        let (dir, resolver) = store();
        fs::write(
            dir.path().join(ROUTE).join(METADATA_FILE),
            "id: [broken",
        )
        .expect("write");
        let err = resolver.resolve_metadata(ROUTE).unwrap_err();
        assert!(matches!(err, CoreError::MalformedMetadata { .. }));
    }
}
