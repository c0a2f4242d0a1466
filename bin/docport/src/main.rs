//! Docport CLI
//!
//! Builds, serves and previews versioned product documentation.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use docport_core::{Config, Engine, config::DEFAULT_CONFIG_FILE};

/// Command-line interface for Docport.
#[derive(Parser)]
#[command(
    name = "docport",
    version,
    about = "Build, serve and preview versioned product documentation"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Convert a product and publish it into the content store
    Build {
        /// Product directory containing docs.yaml and src/
        #[arg(short, long)]
        product: PathBuf,
        /// Content store root (overrides store.root)
        #[arg(short, long)]
        store: Option<PathBuf>,
        /// Conversion engine: markdown or asciidoctor
        #[arg(short, long)]
        engine: Option<Engine>,
    },
    /// Serve the content store API and the portal shell
    Serve {
        /// Content store root (overrides store.root)
        #[arg(short, long)]
        store: Option<PathBuf>,
        /// Portal shell directory (overrides server.shell_dir)
        #[arg(long)]
        shell: Option<PathBuf>,
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Preview one product live from its working tree
    Preview {
        /// Product directory containing docs.yaml and src/
        #[arg(long, default_value = ".")]
        product: PathBuf,
        /// Portal shell directory (overrides server.shell_dir)
        #[arg(long)]
        shell: Option<PathBuf>,
        /// Port to listen on (overrides preview.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Conversion engine: markdown or asciidoctor
        #[arg(short, long)]
        engine: Option<Engine>,
        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },
    /// Validate a product and, optionally, the content store
    Check {
        /// Product directory to validate
        #[arg(long)]
        product: Option<PathBuf>,
        /// Content store to scan for duplicates and unreadable metadata
        #[arg(long)]
        store: Option<PathBuf>,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    docport::init_tracing(cli.verbose);

    let mut config = Config::load(&cli.config).wrap_err("Failed to load configuration")?;
    tracing::debug!(?config, "Loaded configuration");

    match cli.command {
        Commands::Build {
            product,
            store,
            engine,
        } => {
            if let Some(store) = store {
                config.store.root = store;
            }
            if let Some(engine) = engine {
                config.render.engine = engine;
            }
            docport::cmd::build::run(&config, &product)?;
        }
        Commands::Serve { store, shell, port } => {
            if let Some(store) = store {
                config.store.root = store;
            }
            if let Some(shell) = shell {
                config.server.shell_dir = shell;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            docport::cmd::serve::run(&config).await?;
        }
        Commands::Preview {
            product,
            shell,
            port,
            engine,
            open,
        } => {
            if let Some(shell) = shell {
                config.server.shell_dir = shell;
            }
            if let Some(port) = port {
                config.preview.port = port;
            }
            if let Some(engine) = engine {
                config.render.engine = engine;
            }
            docport::cmd::preview::run(&config, &product, open).await?;
        }
        Commands::Check {
            product,
            store,
            strict,
        } => {
            docport::cmd::check::run(&config, product.as_deref(), store.as_deref(), strict)?;
        }
    }

    Ok(())
}
