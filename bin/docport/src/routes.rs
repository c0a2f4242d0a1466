//! Request classification.
//!
//! Every request path is mapped to exactly one [`Route`] before any handler
//! runs. The checks happen in a fixed order: catalog, metadata, content, other
//! `/api` paths, static assets, and finally the single-page shell.
//!
//! API path segments are percent-decoded here, so handlers see the same
//! route strings the catalog publishes (`data/lake/Query Engine/v1`).

/// API prefix shared by the BFF and the preview server.
pub const API_PREFIX: &str = "/api";

/// What a request path asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /api/catalog`
    Catalog,
    /// `GET /api/metadata/{domain}/{system}/{product}/{version}`
    Metadata { route: String },
    /// `GET /api/content/{domain}/{system}/{product}/{version}/{page...}`
    Content { route: String, page: String },
    /// A file of the shell, e.g. `/main.js`. Falls back to the shell when
    /// no such file exists.
    StaticAsset(String),
    /// Any other non-API path; answered with the shell's `index.html`.
    Shell,
    /// An `/api` path that matches no endpoint.
    Unmatched,
}

impl Route {
    /// Classify a raw URI path (no query string).
    pub fn parse(path: &str) -> Self {
        if let Some(rest) = path.strip_prefix(API_PREFIX)
            && (rest.is_empty() || rest.starts_with('/'))
        {
            return Self::parse_api(rest.trim_start_matches('/'));
        }

        let rel = path.trim_start_matches('/');
        let last = rel.rsplit('/').next().unwrap_or_default();
        if last.contains('.') && !last.starts_with('.') {
            Self::StaticAsset(rel.to_string())
        } else {
            Self::Shell
        }
    }

    fn parse_api(rest: &str) -> Self {
        if rest.trim_end_matches('/') == "catalog" {
            return Self::Catalog;
        }

        if let Some(route) = rest.strip_prefix("metadata/") {
            let route = route.trim_end_matches('/');
            if route.is_empty() {
                return Self::Unmatched;
            }
            return match decode_segments(route.split('/')) {
                Some(route) => Self::Metadata { route },
                None => Self::Unmatched,
            };
        }

        if let Some(tail) = rest.strip_prefix("content/") {
            let mut parts = tail.splitn(5, '/');
            let segments: Vec<&str> = parts.by_ref().take(4).collect();
            if segments.len() < 4 || segments.iter().any(|s| s.is_empty()) {
                return Self::Unmatched;
            }
            let page = parts.next().unwrap_or_default();
            return match (
                decode_segments(segments.into_iter()),
                decode_segments(page.split('/')),
            ) {
                (Some(route), Some(page)) => Self::Content { route, page },
                _ => Self::Unmatched,
            };
        }

        Self::Unmatched
    }

    /// Whether the route belongs to the JSON/fragment API.
    pub fn is_api(&self) -> bool {
        matches!(
            self,
            Self::Catalog | Self::Metadata { .. } | Self::Content { .. } | Self::Unmatched
        )
    }
}

/// Percent-decode each segment and rejoin them with `/`.
///
/// A segment that is not UTF-8 after decoding, or that decodes to a path
/// separator, makes the whole path unmatched. `..` stays a segment of its
/// own and is left to the sanitizer.
fn decode_segments<'a>(segments: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut decoded = Vec::new();
    for segment in segments {
        let segment = urlencoding::decode(segment).ok()?;
        if segment.contains(['/', '\\']) {
            return None;
        }
        decoded.push(segment.into_owned());
    }
    Some(decoded.join("/"))
}
