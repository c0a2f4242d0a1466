//! End-to-end tests: build a product, then find and read it back from the store.

use std::{fs, path::Path};

use docport_core::{CoreError, METADATA_FILE};
use docport_render::MarkdownConverter;
use docport_store::{ContentResolver, ProductBuilder, scan};

const S3_DOCS: &str = r#"id: s3-docs
title: S3
hierarchy:
  domain: infra
  system: cloud
  product: S3
navigation:
  - label: Intro
    url: /intro
"#;

fn write_product(dir: &Path) {
    fs::write(dir.join(METADATA_FILE), S3_DOCS).expect("write metadata");
    fs::create_dir_all(dir.join("src")).expect("create src");
    fs::write(dir.join("src/intro.md"), "# Intro\n\nObject storage.\n").expect("write source");
}

#[test]
fn test_built_product_is_discoverable_and_readable() {
    let product = tempfile::tempdir().expect("create temp dir");
    let store = tempfile::tempdir().expect("create temp dir");
    write_product(product.path());

    let converter = MarkdownConverter::new();
    let stats = ProductBuilder::new(product.path(), store.path(), &converter)
        .build()
        .expect("build");
    let written = fs::read_to_string(stats.output_dir.join("intro.html")).expect("read fragment");

    let catalog = scan(store.path());
    let products = catalog.products("infra", "cloud");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].path.to_string(), "infra/cloud/S3/v1");

    let resolver = ContentResolver::new(store.path());
    let artifact = resolver
        .resolve_content("infra/cloud/S3/v1", "intro")
        .expect("resolve content");
    assert_eq!(artifact.html, written);
    assert!(artifact.html.contains("Object storage."));

    let meta = resolver
        .resolve_metadata("infra/cloud/S3/v1")
        .expect("resolve metadata");
    assert_eq!(meta.id, "s3-docs");
    assert_eq!(meta.navigation[0].url, "/intro");
}

#[test]
fn test_traversal_never_leaves_the_store() {
    let product = tempfile::tempdir().expect("create temp dir");
    let store = tempfile::tempdir().expect("create temp dir");
    write_product(product.path());

    let converter = MarkdownConverter::new();
    ProductBuilder::new(product.path(), store.path(), &converter)
        .build()
        .expect("build");

    let resolver = ContentResolver::new(store.path());
    let err = resolver
        .resolve_content("infra/cloud/S3/v1", "../../../etc/passwd")
        .unwrap_err();
    assert!(matches!(err, CoreError::PathTraversal(_)));
}

#[test]
fn test_rebuild_keeps_catalog_stable() {
    let product = tempfile::tempdir().expect("create temp dir");
    let store = tempfile::tempdir().expect("create temp dir");
    write_product(product.path());

    let converter = MarkdownConverter::new();
    let builder = ProductBuilder::new(product.path(), store.path(), &converter);
    builder.build().expect("first build");
    let first = scan(store.path());
    builder.build().expect("second build");

    assert_eq!(first, scan(store.path()));
}
