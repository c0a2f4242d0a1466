//! Product metadata (`docs.yaml`) loading and validation.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// File name of the metadata document, both in a product repository and in the store.
pub const METADATA_FILE: &str = "docs.yaml";

/// Declared position of a product in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hierarchy {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub product: String,
}

impl Hierarchy {
    /// Create a hierarchy from its three segments.
    pub fn new(
        domain: impl Into<String>,
        system: impl Into<String>,
        product: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            system: system.into(),
            product: product.into(),
        }
    }
}

/// One sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    /// Page-relative URL such as `/intro`.
    pub url: String,
}

impl NavItem {
    /// Page identifier this entry points at (`/intro` -> `intro`).
    pub fn page(&self) -> &str {
        self.url.trim_matches('/')
    }
}

/// Product metadata as authored in `docs.yaml`.
///
/// Keys not modelled here are preserved in `extra` and serialized back out,
/// so the metadata API returns the document as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Missing entirely deserializes to empty segments, which validation rejects.
    #[serde(default)]
    pub hierarchy: Hierarchy,

    #[serde(default)]
    pub navigation: Vec<NavItem>,

    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ProductMetadata {
    /// Read and parse a metadata document from disk.
    ///
    /// A missing file is reported as [`CoreError::NotFound`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::not_found(format!(
                    "{METADATA_FILE} not found at {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_yaml(&text, path)
    }

    /// Parse a metadata document. `path` is only used for error messages.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self> {
        let meta: ProductMetadata = serde_yaml::from_str(text)
            .map_err(|e| CoreError::malformed_metadata(path, e.to_string()))?;
        meta.validate(path)?;
        Ok(meta)
    }

    /// Check the hierarchy segments. Defaults are never substituted.
    pub fn validate(&self, path: &Path) -> Result<()> {
        let h = &self.hierarchy;
        for (field, value) in [
            ("domain", &h.domain),
            ("system", &h.system),
            ("product", &h.product),
        ] {
            check_segment(value).map_err(|why| {
                CoreError::malformed_hierarchy(path, format!("hierarchy.{field} {why}"))
            })?;
        }
        Ok(())
    }

    /// Text shown in catalog entries, falling back to `fallback` when none is declared.
    pub fn description_or(&self, fallback: impl FnOnce() -> String) -> String {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(fallback)
    }
}

/// Validate one path segment: non-empty, no separators, not a dot segment.
pub(crate) fn check_segment(value: &str) -> std::result::Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("is missing or empty");
    }
    if value.contains(['/', '\\', '\0']) {
        return Err("must not contain path separators");
    }
    if value == "." || value == ".." {
        return Err("must not be a dot segment");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const S3_DOCS: &str = r#"
id: s3-docs
title: S3
description: Object storage
hierarchy:
  domain: infrastructure
  system: cloud
  product: S3
navigation:
  - label: Intro
    url: /intro
  - label: Buckets
    url: /buckets
owner: storage-team
"#;

    fn path() -> PathBuf {
        PathBuf::from("docs.yaml")
    }

    #[test]
    fn test_parse_metadata() {
        let meta = ProductMetadata::from_yaml(S3_DOCS, &path()).unwrap();
        assert_eq!(meta.id, "s3-docs");
        assert_eq!(meta.title, "S3");
        assert_eq!(meta.hierarchy, Hierarchy::new("infrastructure", "cloud", "S3"));
        assert_eq!(meta.navigation.len(), 2);
        assert_eq!(meta.navigation[0].label, "Intro");
        assert_eq!(meta.navigation[1].page(), "buckets");
    }

    #[test]
    fn test_extra_keys_survive_json() {
        let meta = ProductMetadata::from_yaml(S3_DOCS, &path()).unwrap();
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["owner"], "storage-team");
        assert_eq!(json["hierarchy"]["product"], "S3");
        assert_eq!(json["navigation"][0]["url"], "/intro");
    }

    #[test]
    fn test_missing_hierarchy_is_malformed_hierarchy() {
        let text = "id: x\ntitle: X\n";
        let err = ProductMetadata::from_yaml(text, &path()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedHierarchy { .. }));
    }

    #[test]
    fn test_missing_domain_is_malformed_hierarchy() {
        let text = "id: x\ntitle: X\nhierarchy:\n  system: cloud\n  product: S3\n";
        let err = ProductMetadata::from_yaml(text, &path()).unwrap_err();
        assert!(err.to_string().contains("hierarchy.domain"));
    }

    #[test]
    fn test_separator_in_segment_rejected() {
        let text = "id: x\ntitle: X\nhierarchy:\n  domain: a/b\n  system: c\n  product: d\n";
        let err = ProductMetadata::from_yaml(text, &path()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedHierarchy { .. }));

        let text = "id: x\ntitle: X\nhierarchy:\n  domain: '..'\n  system: c\n  product: d\n";
        assert!(ProductMetadata::from_yaml(text, &path()).is_err());
    }

    #[test]
    fn test_invalid_yaml_is_malformed_metadata() {
        let err = ProductMetadata::from_yaml("id: [unclosed", &path()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_missing_id_is_malformed_metadata() {
        let text = "title: X\nhierarchy:\n  domain: a\n  system: b\n  product: c\n";
        let err = ProductMetadata::from_yaml(text, &path()).unwrap_err();
        assert!(matches!(err, CoreError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = ProductMetadata::load(&dir.path().join(METADATA_FILE)).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let file = dir.path().join(METADATA_FILE);
        std::fs::write(&file, S3_DOCS).expect("write");
        let meta = ProductMetadata::load(&file).expect("load");
        assert_eq!(meta.description.as_deref(), Some("Object storage"));
    }

    #[test]
    fn test_description_fallback() {
        let mut meta = ProductMetadata::from_yaml(S3_DOCS, &path()).unwrap();
        assert_eq!(meta.description_or(|| "none".into()), "Object storage");
        meta.description = None;
        assert_eq!(
            meta.description_or(|| format!("[Preview] {}", meta.title)),
            "[Preview] S3"
        );
    }
}
