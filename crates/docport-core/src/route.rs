//! Hierarchy resolution.
//!
//! A product's route path is `{domain}/{system}/{product}/{version}`. The same
//! string names the product's directory under the content store root and its
//! URL prefix below `/docs/`. The build command, the BFF and the preview server
//! all derive it through [`resolve`], so they agree byte for byte.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Serialize, Serializer};

use crate::{
    error::{CoreError, Result},
    metadata::{ProductMetadata, check_segment},
};

/// Version segment used for every published product.
pub const VERSION: &str = "v1";

/// Public URL prefix under which the shell renders product pages.
pub const DOCS_URL_PREFIX: &str = "/docs";

/// Four-segment location of a product version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutePath {
    domain: String,
    system: String,
    product: String,
    version: String,
}

/// Derive the route path for a product from its declared hierarchy.
///
/// Fails with [`CoreError::MalformedHierarchy`] when any segment is empty or
/// unsafe; no default is ever substituted.
pub fn resolve(meta: &ProductMetadata) -> Result<RoutePath> {
    resolve_at(meta, Path::new(crate::metadata::METADATA_FILE))
}

/// Like [`resolve`], naming `origin` in the error.
pub fn resolve_at(meta: &ProductMetadata, origin: &Path) -> Result<RoutePath> {
    meta.validate(origin)?;
    let h = &meta.hierarchy;
    Ok(RoutePath {
        domain: h.domain.clone(),
        system: h.system.clone(),
        product: h.product.clone(),
        version: VERSION.to_string(),
    })
}

impl RoutePath {
    /// Parse a route path from a request, e.g. `infrastructure/cloud/S3/v1`.
    ///
    /// Returns `None` unless there are exactly four safe segments.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim_matches('/').split('/');
        let domain = parts.next()?;
        let system = parts.next()?;
        let product = parts.next()?;
        let version = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        for segment in [domain, system, product, version] {
            check_segment(segment).ok()?;
        }
        Some(Self {
            domain: domain.to_string(),
            system: system.to_string(),
            product: product.to_string(),
            version: version.to_string(),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Directory of this product version below `root`.
    pub fn dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.domain)
            .join(&self.system)
            .join(&self.product)
            .join(&self.version)
    }

    /// Public URL prefix, e.g. `/docs/infrastructure/cloud/S3/v1`.
    pub fn url_prefix(&self) -> String {
        format!("{DOCS_URL_PREFIX}/{self}")
    }

    /// Resolve a page-relative navigation URL against this route.
    pub fn nav_href(&self, url: &str) -> String {
        let page = url.trim_start_matches('/');
        if page.is_empty() {
            self.url_prefix()
        } else {
            format!("{}/{page}", self.url_prefix())
        }
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.domain, self.system, self.product, self.version
        )
    }
}

impl Serialize for RoutePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl TryFrom<&ProductMetadata> for RoutePath {
    type Error = CoreError;

    fn try_from(meta: &ProductMetadata) -> Result<Self> {
        resolve(meta)
    }
}
