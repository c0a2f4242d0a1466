//! Data sources behind the three API endpoints.
//!
//! The BFF answers from the published store; the preview server answers from
//! one product's working tree. Both implement [`DocsBackend`] so the HTTP
//! layer is shared.

use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docport_core::{CoreError, ProductMetadata};
use docport_render::RenderError;
use docport_store::{Artifact, Catalog, ContentResolver, scan_with_report};
use serde_json::json;
use thiserror::Error;

/// Source of catalog, metadata and content.
pub trait DocsBackend: Send + Sync {
    fn catalog(&self) -> Catalog;

    fn metadata(&self, route: &str) -> Result<ProductMetadata, ApiError>;

    fn content(&self, route: &str, page: &str) -> Result<Artifact, ApiError>;
}

/// What the API reports for a failed lookup.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, or rejected by path sanitizing.
    #[error("{0} not found")]
    NotFound(Resource),

    /// Present but unusable.
    #[error("failed to load {resource}: {source}")]
    Load {
        resource: Resource,
        #[source]
        source: CoreError,
    },

    /// Live conversion failed (preview only).
    #[error("conversion failed: {0}")]
    Conversion(#[from] RenderError),

    /// The blocking lookup task died.
    #[error("lookup task failed: {0}")]
    Task(String),
}

/// Kind of thing being looked up, for error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Metadata,
    Content,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Metadata => "Metadata",
            Self::Content => "Content",
        })
    }
}

impl ApiError {
    /// Classify a core error. Traversal attempts become plain not-found.
    pub fn from_core(resource: Resource, err: CoreError) -> Self {
        if err.is_not_found() {
            if matches!(err, CoreError::PathTraversal(_)) {
                tracing::warn!(error = %err, "rejected path traversal attempt");
            } else {
                tracing::debug!(error = %err, "lookup missed");
            }
            Self::NotFound(resource)
        } else {
            Self::Load {
                resource,
                source: err,
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{resource} not found") })),
            )
                .into_response(),
            Self::Load { resource, source } => {
                tracing::error!(error = %source, "failed to load {resource}");
                let what = match resource {
                    Resource::Metadata => "metadata",
                    Resource::Content => "content",
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": format!("Failed to load {what}") })),
                )
                    .into_response()
            }
            Self::Conversion(err) => {
                tracing::error!(error = %err, "conversion error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [("content-type", "text/plain; charset=utf-8")],
                    "Error converting source",
                )
                    .into_response()
            }
            Self::Task(message) => {
                tracing::error!(%message, "lookup task failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Backend reading the published content store.
#[derive(Debug, Clone)]
pub struct StoreBackend {
    resolver: ContentResolver,
}

impl StoreBackend {
    pub fn new(store_root: impl Into<PathBuf>) -> Self {
        Self {
            resolver: ContentResolver::new(store_root),
        }
    }
}

impl DocsBackend for StoreBackend {
    fn catalog(&self) -> Catalog {
        let report = scan_with_report(self.resolver.root());
        for dup in &report.duplicates {
            tracing::warn!(
                route = %dup.route,
                sources = ?dup.sources,
                "duplicate hierarchy in store; all entries listed"
            );
        }
        report.catalog
    }

    fn metadata(&self, route: &str) -> Result<ProductMetadata, ApiError> {
        self.resolver
            .resolve_metadata(route)
            .map_err(|e| ApiError::from_core(Resource::Metadata, e))
    }

    fn content(&self, route: &str, page: &str) -> Result<Artifact, ApiError> {
        self.resolver
            .resolve_content(route, page)
            .map_err(|e| ApiError::from_core(Resource::Content, e))
    }
}
