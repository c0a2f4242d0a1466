//! HTTP surface shared by the BFF and the preview server.

use std::{convert::Infallible, path::PathBuf, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tower::ServiceExt;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    backend::{ApiError, DocsBackend, Resource},
    routes::Route,
};

/// Path of the Server-Sent Events endpoint used for live reload.
pub const LIVERELOAD_PATH: &str = "/__livereload";

/// Live reload message type.
#[derive(Debug, Clone)]
pub enum ReloadMessage {
    /// Full page reload.
    Reload,
}

/// Reload broadcaster for connected browsers.
#[derive(Clone)]
pub struct ServerState {
    /// Broadcast channel for live reload events.
    pub reload_tx: broadcast::Sender<ReloadMessage>,
}

impl ServerState {
    /// Create a new server state.
    pub fn new() -> Self {
        let (reload_tx, _) = broadcast::channel(16);
        Self { reload_tx }
    }

    /// Send a reload notification to all connected clients.
    pub fn notify_reload(&self) {
        let _ = self.reload_tx.send(ReloadMessage::Reload);
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a request handler needs.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn DocsBackend>,
    /// Directory holding `index.html` and the shell's assets.
    pub shell_dir: PathBuf,
    /// Present when the server pushes live reloads.
    pub reload: Option<Arc<ServerState>>,
}

impl AppState {
    pub fn new(backend: Arc<dyn DocsBackend>, shell_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            shell_dir: shell_dir.into(),
            reload: None,
        }
    }

    #[must_use]
    pub fn with_reload(mut self, reload: Arc<ServerState>) -> Self {
        self.reload = Some(reload);
        self
    }
}

/// Create the router: live reload plus one dispatcher for every other path.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(livereload_handler))
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Classify the request with [`Route::parse`] and answer it.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let route = Route::parse(request.uri().path());
    tracing::debug!(?route, api = route.is_api(), "dispatching");

    match route {
        Route::Catalog => {
            let backend = state.backend.clone();
            match blocking(move || Ok(backend.catalog())).await {
                Ok(catalog) => Json(catalog).into_response(),
                Err(e) => e.into_response(),
            }
        }
        Route::Metadata { route } => {
            let backend = state.backend.clone();
            match blocking(move || backend.metadata(&route)).await {
                Ok(meta) => Json(meta).into_response(),
                Err(e) => e.into_response(),
            }
        }
        Route::Content { route, page } => {
            let backend = state.backend.clone();
            match blocking(move || backend.content(&route, &page)).await {
                Ok(artifact) => Html(artifact.html).into_response(),
                Err(e) => e.into_response(),
            }
        }
        Route::Unmatched => ApiError::NotFound(Resource::Content).into_response(),
        Route::StaticAsset(_) => serve_asset(&state, request).await,
        Route::Shell => serve_shell(&state).await,
    }
}

/// Run a storage lookup off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
}

/// Serve a shell file; a dotted client route such as `.../release-1.2`
/// that names no file gets the shell instead.
async fn serve_asset(state: &AppState, request: Request) -> Response {
    let response = match ServeDir::new(&state.shell_dir).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    if response.status() == StatusCode::NOT_FOUND {
        return serve_shell(state).await;
    }
    response.into_response()
}

async fn serve_shell(state: &AppState) -> Response {
    let index = state.shell_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(html) if state.reload.is_some() => Html(inject_livereload(&html)).into_response(),
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::debug!(path = %index.display(), error = %e, "shell not available");
            (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
        }
    }
}

/// Server-Sent Events handler for live reload.
async fn livereload_handler(State(state): State<AppState>) -> Response {
    let Some(reload) = state.reload else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let rx = reload.reload_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(ReloadMessage::Reload) => Some(Ok::<_, Infallible>(Event::default().data("reload"))),
        // Lagged receivers just miss intermediate events.
        Err(_) => None,
    });

    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("ping"),
        )
        .into_response()
}

/// Add the reload script to an HTML page, once.
pub fn inject_livereload(html: &str) -> String {
    if html.contains(LIVERELOAD_PATH) {
        return html.to_string();
    }
    match html.rfind("</body>") {
        Some(pos) => format!("{}{LIVERELOAD_SCRIPT}{}", &html[..pos], &html[pos..]),
        None => format!("{html}{LIVERELOAD_SCRIPT}"),
    }
}

/// JavaScript snippet to inject for live reload.
pub const LIVERELOAD_SCRIPT: &str = r#"
<script>
(function() {
    const source = new EventSource('/__livereload');
    source.onmessage = function(event) {
        if (event.data === 'reload') {
            window.location.reload();
        }
    };
    source.onerror = function() {
        console.log('[livereload] Connection lost, retrying...');
    };
})();
</script>
"#;

/// Body for UI routes when no shell is available.
const NOT_FOUND_PAGE: &str = "<!doctype html>\n<html><head><title>Not Found</title></head>\
<body><h1>404 - Not Found</h1><p>The requested documentation page does not exist.</p></body></html>\n";
