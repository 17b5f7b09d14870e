//! Router construction.
//!
//! Builds the content router and the live reload notification router. The
//! two are served on separate ports.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;

use crate::live_reload::{self, NotificationHub};
use crate::middleware::no_cache;
use crate::state::AppState;
use crate::static_files;

/// Create the content router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    static_files::static_router()
        .layer(
            ServiceBuilder::new()
                .layer(no_cache::cache_control_layer())
                .layer(no_cache::pragma_layer())
                .layer(no_cache::expires_layer()),
        )
        .with_state(state)
}

/// Create the notification router accepting live reload WebSocket clients.
pub(crate) fn notify_router(hub: NotificationHub) -> Router {
    Router::new()
        .route("/", get(live_reload::ws_handler))
        .with_state(hub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const INDEX: &str = "<!doctype html><html><head><title>App</title></head><body><div id=\"root\"></div></body></html>";
    const STYLE: &str = "body { color: rebeccapurple; }";

    fn site() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), INDEX).unwrap();
        std::fs::write(dir.path().join("style.css"), STYLE).unwrap();
        dir
    }

    fn router(root: &Path) -> Router {
        create_router(Arc::new(AppState {
            root: root.to_path_buf(),
            bind_host: "localhost".to_owned(),
            notify_port: 3001,
        }))
    }

    async fn send_get(router: Router, uri: &str) -> Response {
        router
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::HOST, "localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_no_cache_headers(response: &Response) {
        let headers = response.headers();
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "no-store, no-cache, must-revalidate"
        );
        assert_eq!(headers.get(header::PRAGMA).unwrap(), "no-cache");
        assert_eq!(headers.get(header::EXPIRES).unwrap(), "0");
    }

    #[tokio::test]
    async fn test_existing_file_served_verbatim() {
        let dir = site();

        let response = send_get(router(dir.path()), "/style.css").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/css");
        assert_no_cache_headers(&response);
        assert_eq!(body_string(response).await, STYLE);
    }

    #[tokio::test]
    async fn test_nested_binary_file_served_verbatim() {
        let dir = site();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        let bytes = [0x89_u8, b'P', b'N', b'G', 0x00, 0xff];
        std::fs::write(dir.path().join("assets/logo.png"), bytes).unwrap();

        let response = send_get(router(dir.path()), "/assets/logo.png").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
        assert_no_cache_headers(&response);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), bytes.as_slice());
    }

    #[tokio::test]
    async fn test_missing_path_serves_index_with_bootstrap() {
        let dir = site();

        let response = send_get(router(dir.path()), "/nope").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_no_cache_headers(&response);

        let body = body_string(response).await;
        assert!(body.starts_with("<!doctype html>"));
        assert_eq!(body.matches("new WebSocket(").count(), 1);
        assert!(body.contains("ws://localhost:3001"));
        assert!(body.contains("</script>\n</body>"));
        assert!(!body.contains("{host}"));
        assert!(!body.contains("{notify_port}"));
    }

    #[tokio::test]
    async fn test_deep_spa_route_serves_index() {
        let dir = site();

        let response = send_get(router(dir.path()), "/users/42/settings?tab=profile").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("<div id=\"root\"></div>"));
    }

    #[tokio::test]
    async fn test_root_serves_index_with_bootstrap() {
        let dir = site();

        let response = send_get(router(dir.path()), "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_no_cache_headers(&response);
        assert_eq!(body_string(response).await.matches("ws://localhost:3001").count(), 1);
    }

    #[tokio::test]
    async fn test_file_with_trailing_slash_falls_back_to_index() {
        let dir = site();

        let response = send_get(router(dir.path()), "/style.css/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        let body = body_string(response).await;
        assert!(!body.contains(STYLE));
        assert!(body.contains("<div id=\"root\"></div>"));
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let dir = site();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), "<body>docs</body>").unwrap();

        let response = send_get(router(dir.path()), "/docs?v=1").await;

        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/docs/?v=1");
        assert_no_cache_headers(&response);
    }

    #[tokio::test]
    async fn test_directory_index_served_with_bootstrap() {
        let dir = site();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), "<body>docs</body>").unwrap();

        let response = send_get(router(dir.path()), "/docs/").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.starts_with("<body>docs<script>"));
        assert!(body.ends_with("</script>\n</body>"));
    }

    #[tokio::test]
    async fn test_bootstrap_uses_request_host() {
        let dir = site();
        let response = router(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/somewhere")
                    .header(header::HOST, "192.168.1.20:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(body_string(response).await.contains("ws://192.168.1.20:3001"));
    }

    #[tokio::test]
    async fn test_missing_index_degrades_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), STYLE).unwrap();

        let response = send_get(router(dir.path()), "/nope").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_no_cache_headers(&response);

        // Existing files are unaffected
        let response = send_get(router(dir.path()), "/style.css").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unreadable_index_degrades_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), [0xff_u8, 0xfe, 0x00]).unwrap();

        let response = send_get(router(dir.path()), "/nope").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = site();

        let response = send_get(router(dir.path()), "/%2e%2e/%2e%2e/etc/passwd").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_no_cache_headers(&response);
    }

    #[tokio::test]
    async fn test_non_get_method_not_allowed() {
        let dir = site();
        let response = router(dir.path())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/style.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_no_cache_headers(&response);
    }

    #[tokio::test]
    async fn test_head_returns_headers_only() {
        let dir = site();
        let response = router(dir.path())
            .oneshot(
                Request::builder()
                    .method("HEAD")
                    .uri("/style.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_no_cache_headers(&response);
        assert!(body_string(response).await.is_empty());
    }
}
