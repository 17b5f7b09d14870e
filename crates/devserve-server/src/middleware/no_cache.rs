//! Cache-defeating headers middleware.
//!
//! Adds headers to all responses so browsers never reuse a stale copy:
//! - Cache-Control
//! - Pragma
//! - Expires

use axum::http::HeaderValue;
use axum::http::header;
use tower_http::set_header::SetResponseHeaderLayer;

/// Cache-Control header value.
const CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate";

/// Create layer that adds Cache-Control header.
pub(crate) fn cache_control_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL))
}

/// Create layer that adds Pragma header.
pub(crate) fn pragma_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::PRAGMA, HeaderValue::from_static("no-cache"))
}

/// Create layer that adds Expires header.
pub(crate) fn expires_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::EXPIRES, HeaderValue::from_static("0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_control_value() {
        assert!(CACHE_CONTROL.contains("no-store"));
        assert!(CACHE_CONTROL.contains("no-cache"));
        assert!(CACHE_CONTROL.contains("must-revalidate"));
    }
}
