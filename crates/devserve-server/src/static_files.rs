//! Static file serving.
//!
//! Serves files from the served directory with SPA fallback: any path that
//! does not name an existing file gets the root `index.html`, with the live
//! reload bootstrap injected.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use percent_encoding::percent_decode_str;

use crate::bootstrap;
use crate::state::AppState;

/// Index document served for directories and unknown paths.
pub(crate) const INDEX_DOCUMENT: &str = "index.html";

/// Create router for static file serving with SPA fallback.
pub(crate) fn static_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(serve_path))
        .route("/{*path}", get(serve_path))
}

/// Serve a file, a directory index, or the SPA fallback document.
async fn serve_path(State(state): State<Arc<AppState>>, uri: Uri, headers: HeaderMap) -> Response {
    let request_path = uri.path();
    tracing::debug!(path = request_path, "Serving request");

    let Some(relative) = resolve_request_path(request_path) else {
        tracing::warn!(path = request_path, "Rejected path outside served directory");
        return StatusCode::BAD_REQUEST.into_response();
    };
    let candidate = state.root.join(&relative);

    match tokio::fs::metadata(&candidate).await {
        // A trailing slash names a directory, never a file
        Ok(meta) if meta.is_file() && !request_path.ends_with('/') => serve_file(&candidate).await,
        Ok(meta) if meta.is_dir() => {
            let index = candidate.join(INDEX_DOCUMENT);
            if !is_file(&index).await {
                return spa_fallback(&state, &headers).await;
            }
            if !request_path.ends_with('/') {
                // Relative links inside the index resolve against the slash form
                let mut location = format!("{request_path}/");
                if let Some(query) = uri.query() {
                    location.push('?');
                    location.push_str(query);
                }
                return Redirect::permanent(&location).into_response();
            }
            serve_index(&state, &index, &headers)
                .await
                .unwrap_or_else(not_found)
        }
        _ => spa_fallback(&state, &headers).await,
    }
}

/// Translate a URL path into a path relative to the served directory.
///
/// Returns `None` for paths that would escape the root.
pub(crate) fn resolve_request_path(path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let mut relative = PathBuf::new();

    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment.contains('\0') {
            return None;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => relative.push(segment),
            // Parent dirs, drive prefixes and embedded separators
            _ => return None,
        }
    }

    Some(relative)
}

/// Serve an existing file with its guessed content type.
async fn serve_file(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(content))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read file");
            not_found()
        }
    }
}

/// Serve the root index document for client-side routing.
async fn spa_fallback(state: &AppState, headers: &HeaderMap) -> Response {
    serve_index(state, &state.index_path(), headers)
        .await
        .unwrap_or_else(not_found)
}

/// Read an index document and inject the live reload bootstrap.
///
/// Returns `None` after logging when the document cannot be read.
async fn serve_index(state: &AppState, index: &Path, headers: &HeaderMap) -> Option<Response> {
    let document = match tokio::fs::read_to_string(index).await {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(
                path = %index.display(),
                error = %e,
                "Could not inject live reload script or serve index.html"
            );
            return None;
        }
    };

    let host = bootstrap::request_host(headers, &state.bind_host);
    let script = bootstrap::bootstrap_script(&host, state.notify_port);
    let body = bootstrap::inject(&document, &script);

    Some(
        (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response(),
    )
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}
