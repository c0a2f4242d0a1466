//! Tool configuration.
//!
//! Loaded from an optional TOML file and `DOCPORT__*` environment variables.
//! Every field has a default, so running without a config file is normal.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "docport.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content store settings.
    pub store: StoreConfig,

    /// BFF server settings.
    pub server: ServerConfig,

    /// Preview server settings.
    pub preview: PreviewConfig,

    /// Conversion engine settings.
    pub render: RenderConfig,
}

/// Content store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory of the published content store.
    pub root: PathBuf,
}

/// BFF server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the single-page shell (`index.html` and assets).
    pub shell_dir: PathBuf,
}

/// Preview server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub port: u16,
    /// Watch sources and push reloads to the browser.
    pub watch: bool,
}

/// Which conversion engine turns sources into fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Markdown sources (`.md`), converted in-process.
    Markdown,
    /// AsciiDoc sources (`.adoc`), converted by the `asciidoctor` executable.
    #[default]
    Asciidoctor,
}

impl std::str::FromStr for Engine {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "asciidoctor" | "asciidoc" | "adoc" => Ok(Self::Asciidoctor),
            other => Err(CoreError::config(format!("unknown engine: {other}"))),
        }
    }
}

/// Conversion engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub engine: Engine,
    /// Render the document title as a heading.
    pub show_title: bool,
    /// syntect theme for highlighted code blocks.
    pub syntax_theme: String,
    /// Executable used by the asciidoctor engine.
    pub asciidoctor_bin: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dist"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            shell_dir: PathBuf::from("portal/public"),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            watch: true,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            show_title: true,
            syntax_theme: "base16-ocean.dark".to_string(),
            asciidoctor_bin: "asciidoctor".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path` (if it exists) layered with `DOCPORT__*` variables.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading configuration file");
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("DOCPORT").separator("__"))
            .build()
            .map_err(|e| CoreError::config_with_source("failed to read configuration", e))?;

        let config: Config = settings.try_deserialize().map_err(|e| {
            CoreError::config_with_source(
                format!("failed to parse configuration: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.store.root.as_os_str().is_empty() {
            return Err(CoreError::config("store.root cannot be empty"));
        }
        if self.server.port == 0 {
            return Err(CoreError::config("server.port cannot be 0"));
        }
        if self.preview.port == 0 {
            return Err(CoreError::config("preview.port cannot be 0"));
        }
        Ok(())
    }

    /// Socket address for a server listening on `port`.
    pub fn bind_addr(&self, port: u16) -> Result<SocketAddr> {
        format!("{}:{port}", self.server.host)
            .parse()
            .map_err(|e| {
                CoreError::config_with_source(
                    format!("invalid server.host: {}", self.server.host),
                    e,
                )
            })
    }
}
