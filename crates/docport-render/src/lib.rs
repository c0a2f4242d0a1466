//! docport Render Library
//!
//! Conversion engines that turn one source document into an HTML fragment
//! (body content only, no `<html>`/`<head>` shell).
//!
//! # Engines
//!
//! - [`MarkdownConverter`] - in-process Markdown via pulldown-cmark
//! - [`AsciidoctorConverter`] - AsciiDoc via the external `asciidoctor` executable

pub mod asciidoctor;
pub mod markdown;
pub mod syntax;

use std::path::{Path, PathBuf};

pub use asciidoctor::AsciidoctorConverter;
use docport_core::config::{Engine, RenderConfig};
pub use markdown::MarkdownConverter;
pub use syntax::SyntaxHighlighter;
use thiserror::Error;

/// Conversion errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The engine ran but rejected the document.
    #[error("conversion of {path} failed: {message}")]
    Failed { path: PathBuf, message: String },

    /// The engine could not be started at all.
    #[error("{engine} is not available: {source}")]
    EngineUnavailable {
        engine: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error while talking to the engine.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Create a new conversion failure.
    pub fn failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Failed {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// A source-to-fragment conversion engine.
///
/// Implementations are stateless per call and shared across requests.
pub trait Converter: Send + Sync {
    /// Extension (without dot) of the source documents this engine reads.
    fn source_extension(&self) -> &'static str;

    /// Convert one document. `path` names the source for diagnostics.
    fn convert(&self, source: &str, path: &Path) -> Result<String>;

    /// Whether `path` is a source document for this engine.
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.source_extension()))
    }
}

/// Build the converter selected by the render configuration.
pub fn converter_for(config: &RenderConfig) -> Box<dyn Converter> {
    match config.engine {
        Engine::Markdown => Box::new(
            MarkdownConverter::with_theme(&config.syntax_theme).show_title(config.show_title),
        ),
        Engine::Asciidoctor => Box::new(
            AsciidoctorConverter::new(&config.asciidoctor_bin).show_title(config.show_title),
        ),
    }
}

/// Escape HTML special characters.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
