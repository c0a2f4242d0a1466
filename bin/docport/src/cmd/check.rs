//! Check command - validate a product and the content store

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use color_eyre::eyre::{Result, bail};
use docport_core::{Config, DEFAULT_PAGE, METADATA_FILE, ProductMetadata, route, sanitize};
use docport_render::{Converter, converter_for};
use docport_store::{FRAGMENT_EXTENSION, SOURCE_DIR, scan_with_report};

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates the product at `product_dir` and, when `store` is given, the
/// published content store. With neither, the current directory is checked
/// as a product.
pub fn run(
    config: &Config,
    product_dir: Option<&Path>,
    store: Option<&Path>,
    strict: bool,
) -> Result<()> {
    tracing::info!(?product_dir, ?store, strict, "Checking");

    let mut result = ValidationResult::default();

    let product_dir = match (product_dir, store) {
        (None, None) => Some(Path::new(".")),
        (dir, _) => dir,
    };

    if let Some(dir) = product_dir {
        println!("Checking product {}...", dir.display());
        let converter = converter_for(&config.render);
        check_product(dir, converter.as_ref(), &mut result);
    }

    if let Some(store) = store {
        println!("\nChecking content store {}...", store.display());
        check_store(store, &mut result);
    }

    // Print summary
    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Metadata, navigation and sources of one product.
fn check_product(dir: &Path, converter: &dyn Converter, result: &mut ValidationResult) {
    let docs = dir.join(METADATA_FILE);
    let meta = match ProductMetadata::load(&docs) {
        Ok(meta) => meta,
        Err(e) => {
            result.add_error(format!("{}: {e}", docs.display()));
            println!("  ✗ {METADATA_FILE} invalid");
            return;
        }
    };

    match route::resolve_at(&meta, &docs) {
        Ok(route) => println!("  ✓ {METADATA_FILE} valid, route {route}"),
        Err(e) => {
            result.add_error(e.to_string());
            println!("  ✗ hierarchy invalid");
        }
    }

    let src_dir = dir.join(SOURCE_DIR);
    if !src_dir.is_dir() {
        result.add_warning(format!("Source directory missing: {}", src_dir.display()));
        println!("  ⚠ {SOURCE_DIR}/ missing");
        return;
    }

    let linked = check_navigation(&meta, &src_dir, converter, result);
    check_sources(&src_dir, converter, &linked, result);
}

/// Every navigation entry must point at an existing source document.
///
/// Returns the source files that navigation links to.
fn check_navigation(
    meta: &ProductMetadata,
    src_dir: &Path,
    converter: &dyn Converter,
    result: &mut ValidationResult,
) -> BTreeSet<PathBuf> {
    let mut linked = BTreeSet::new();
    let mut missing = 0;

    for item in &meta.navigation {
        let page = item.page();
        let page = page
            .strip_suffix(&format!(".{FRAGMENT_EXTENSION}"))
            .unwrap_or(page);

        let source = match sanitize(src_dir, page) {
            Ok(path) => {
                let mut file = path.into_os_string();
                file.push(".");
                file.push(converter.source_extension());
                PathBuf::from(file)
            }
            Err(e) => {
                result.add_error(format!("Navigation '{}': {e}", item.label));
                missing += 1;
                continue;
            }
        };

        if source.is_file() {
            linked.insert(source);
        } else {
            result.add_warning(format!(
                "Navigation '{}' ({}) has no source document {}",
                item.label,
                item.url,
                source.display()
            ));
            missing += 1;
        }
    }

    if meta.navigation.is_empty() {
        result.add_warning(format!(
            "No navigation entries; readers land on '{DEFAULT_PAGE}' only"
        ));
    }

    if missing == 0 {
        println!("  ✓ All {} navigation entries resolve", meta.navigation.len());
    } else {
        println!("  ⚠ {missing}/{} navigation entries broken", meta.navigation.len());
    }

    linked
}

/// Every source document must convert.
fn check_sources(
    src_dir: &Path,
    converter: &dyn Converter,
    linked: &BTreeSet<PathBuf>,
    result: &mut ValidationResult,
) {
    let (mut sources, mut ignored): (Vec<PathBuf>, Vec<PathBuf>) = match fs::read_dir(src_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .partition(|p| converter.accepts(p)),
        Err(e) => {
            result.add_error(format!("{}: {e}", src_dir.display()));
            return;
        }
    };
    sources.sort();
    ignored.sort();

    for path in &ignored {
        result.add_warning(format!(
            "{} is not read by the .{} engine and will not be published",
            path.display(),
            converter.source_extension()
        ));
    }

    let mut failed = 0;
    for path in &sources {
        let converted = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                converter
                    .convert(&text, path)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = converted {
            result.add_error(format!("{}: {e}", path.display()));
            failed += 1;
        }

        if !linked.contains(path) {
            result.add_warning(format!(
                "{} is not linked from navigation",
                path.display()
            ));
        }
    }

    if failed == 0 {
        println!("  ✓ All {} source documents convert", sources.len());
    } else {
        println!("  ✗ {failed}/{} source documents have errors", sources.len());
    }
}

/// Scan the store the way the BFF does and report what it would hide.
fn check_store(store: &Path, result: &mut ValidationResult) {
    if !store.is_dir() {
        result.add_error(format!("Content store does not exist: {}", store.display()));
        println!("  ✗ store missing");
        return;
    }

    let report = scan_with_report(store);
    println!("  ✓ {} products in catalog", report.catalog.len());

    for dup in &report.duplicates {
        let sources: Vec<String> = dup
            .sources
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        result.add_error(format!(
            "Duplicate hierarchy {} declared by: {}",
            dup.route,
            sources.join(", ")
        ));
    }

    for skipped in &report.skipped {
        result.add_warning(format!(
            "Skipped {}: {}",
            skipped.path.display(),
            skipped.reason
        ));
    }
}

#[cfg(test)]
mod tests {
    use docport_render::MarkdownConverter;

    use super::*;

    const DOCS: &str = "id: s3-docs\ntitle: S3\nhierarchy:\n  domain: infrastructure\n  system: cloud\n  product: S3\nnavigation:\n  - label: Intro\n    url: /intro\n  - label: Setup\n    url: /setup\n";

    fn product(sources: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join(METADATA_FILE), DOCS).expect("write");
        fs::create_dir_all(dir.path().join(SOURCE_DIR)).expect("create dir");
        for (name, body) in sources {
            fs::write(dir.path().join(SOURCE_DIR).join(name), body).expect("write");
        }
        dir
    }

    fn check(dir: &Path) -> ValidationResult {
        let mut result = ValidationResult::default();
        check_product(dir, &MarkdownConverter::new(), &mut result);
        result
    }

    #[test]
    fn test_valid_product() {
        let dir = product(&[("intro.md", "# Intro"), ("setup.md", "# Setup")]);
        let result = check(dir.path());
        assert!(!result.has_errors(), "{:?}", result.errors);
        assert!(!result.has_warnings(), "{:?}", result.warnings);
    }

    #[test]
    fn test_missing_nav_target_warns() {
        let dir = product(&[("intro.md", "# Intro")]);
        let result = check(dir.path());
        assert!(!result.has_errors());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Setup"));
    }

    #[test]
    fn test_unlinked_source_warns() {
        let dir = product(&[("intro.md", ""), ("setup.md", ""), ("extra.md", "")]);
        let result = check(dir.path());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("extra.md"));
    }

    #[test]
    fn test_sources_of_other_engine_warn() {
        let dir = product(&[("intro.md", ""), ("setup.md", ""), ("legacy.adoc", "")]);
        let result = check(dir.path());
        assert!(!result.has_errors());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("legacy.adoc"));
    }

    #[test]
    fn test_missing_metadata_is_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = check(dir.path());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_bad_front_matter_is_error() {
        let dir = product(&[
            ("intro.md", "---\ntitle: [unclosed\n---\nbody"),
            ("setup.md", ""),
        ]);
        let result = check(dir.path());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("intro.md"));
    }

    #[test]
    fn test_store_duplicates_are_errors() {
        let store = tempfile::tempdir().expect("create temp dir");
        for dir in ["a", "b"] {
            let path = store.path().join(dir);
            fs::create_dir_all(&path).expect("create dir");
            fs::write(path.join(METADATA_FILE), DOCS).expect("write");
        }
        let mut result = ValidationResult::default();
        check_store(store.path(), &mut result);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("infrastructure/cloud/S3/v1"));
    }

    #[test]
    fn test_run_strict_fails_on_warnings() {
        let dir = product(&[("intro.md", "# Intro")]);
        let mut config = Config::default();
        config.render.engine = docport_core::Engine::Markdown;
        assert!(run(&config, Some(dir.path()), None, false).is_ok());
        assert!(run(&config, Some(dir.path()), None, true).is_err());
    }
}
