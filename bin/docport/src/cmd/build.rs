//! Build command - publishes one product into the content store

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use docport_core::Config;
use docport_render::converter_for;
use docport_store::ProductBuilder;

/// Run the build command.
///
/// Converts the product at `product_dir` and publishes it under its route
/// directory in `config.store.root`.
pub fn run(config: &Config, product_dir: &Path) -> Result<()> {
    let start = Instant::now();
    tracing::info!(
        product = %product_dir.display(),
        store = %config.store.root.display(),
        engine = ?config.render.engine,
        "Starting build"
    );

    let converter = converter_for(&config.render);
    let builder = ProductBuilder::new(product_dir, &config.store.root, converter.as_ref());
    let stats = builder.build().wrap_err("Build failed")?;

    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Route:      {}", stats.route);
    println!("  Pages:      {}", stats.pages);
    if !stats.ignored.is_empty() {
        println!(
            "  Ignored:    {} (engine reads .{} files only)",
            stats.ignored.len(),
            converter.source_extension()
        );
        for path in &stats.ignored {
            println!("    ⚠ {}", path.display());
        }
    }
    println!("  Output:     {}", stats.output_dir.display());
    println!("  URL:        {}", stats.route.url_prefix());
    println!();
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}
