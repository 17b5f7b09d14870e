//! Live reload client bootstrap.
//!
//! Builds the script that connects a page to the notification channel and
//! splices it into HTML documents.

use axum::http::HeaderMap;
use axum::http::header;
use axum::http::uri::Authority;

use crate::live_reload::ReloadSignal;

/// Closing tag the bootstrap is inserted before.
const BODY_CLOSE: &str = "</body>";

/// Build the bootstrap script for a notification endpoint.
pub(crate) fn bootstrap_script(host: &str, notify_port: u16) -> String {
    let signal = ReloadSignal::Reload.as_str();
    format!(
        r"<script>
  (function() {{
    const ws = new WebSocket('ws://{host}:{notify_port}');
    ws.onmessage = (event) => {{ if (event.data === '{signal}') window.location.reload(); }};
    console.log('Live-reload enabled.');
  }})();
</script>
"
    )
}

/// Insert `script` immediately before the last closing body tag.
///
/// The tag is matched case-insensitively. Documents without one get the
/// script appended.
pub(crate) fn inject(document: &str, script: &str) -> String {
    let mut out = String::with_capacity(document.len() + script.len());
    match document.to_ascii_lowercase().rfind(BODY_CLOSE) {
        Some(index) => {
            out.push_str(&document[..index]);
            out.push_str(script);
            out.push_str(&document[index..]);
        }
        None => {
            out.push_str(document);
            out.push_str(script);
        }
    }
    out
}

/// Host name the browser used to reach us, without the port.
///
/// Falls back to `bind_host` when the `Host` header is missing or carries
/// anything other than a plain hostname or address.
pub(crate) fn request_host(headers: &HeaderMap, bind_host: &str) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Authority>().ok())
        .map(|authority| authority.host().to_owned())
        .filter(|host| is_plain_host(host))
        .unwrap_or_else(|| url_host(bind_host))
}

/// Wrap bare IPv6 addresses in brackets for use in a URL.
fn url_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_owned()
    }
}

/// Hostnames and IP literals only, so the value is safe inside the script.
fn is_plain_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '[' | ']'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_host(host: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_str(host).unwrap());
        headers
    }

    #[test]
    fn test_bootstrap_script_references_endpoint() {
        let script = bootstrap_script("localhost", 3001);

        assert!(script.contains("new WebSocket('ws://localhost:3001')"));
        assert!(script.contains("event.data === 'reload'"));
        assert!(script.contains("window.location.reload()"));
        assert!(script.starts_with("<script>"));
        assert!(script.trim_end().ends_with("</script>"));
        assert!(!script.contains("{host}") && !script.contains("{notify_port}"));
    }

    #[test]
    fn test_inject_before_body_close() {
        let html = "<html><body><h1>App</h1></body></html>";
        let result = inject(html, "<script>x</script>");

        assert_eq!(
            result,
            "<html><body><h1>App</h1><script>x</script></body></html>"
        );
    }

    #[test]
    fn test_inject_uses_last_body_close() {
        let html = "<body><pre>&lt;/body&gt; </body></pre></body>";
        let result = inject(html, "<s/>");

        assert_eq!(result, "<body><pre>&lt;/body&gt; </body></pre><s/></body>");
        assert_eq!(result.matches("<s/>").count(), 1);
    }

    #[test]
    fn test_inject_case_insensitive() {
        let result = inject("<BODY>hi</BODY>", "<s/>");
        assert_eq!(result, "<BODY>hi<s/></BODY>");
    }

    #[test]
    fn test_inject_without_body_appends() {
        let result = inject("<p>fragment</p>", "<s/>");
        assert_eq!(result, "<p>fragment</p><s/>");
    }

    #[test]
    fn test_request_host_strips_port() {
        let headers = headers_with_host("127.0.0.1:3000");
        assert_eq!(request_host(&headers, "localhost"), "127.0.0.1");
    }

    #[test]
    fn test_request_host_ipv6() {
        let headers = headers_with_host("[::1]:3000");
        assert_eq!(request_host(&headers, "localhost"), "[::1]");
    }

    #[test]
    fn test_request_host_missing_header_uses_bind_host() {
        assert_eq!(request_host(&HeaderMap::new(), "localhost"), "localhost");
        assert_eq!(request_host(&HeaderMap::new(), "::1"), "[::1]");
    }

    #[test]
    fn test_request_host_rejects_script_breaking_values() {
        let headers = headers_with_host("evil');alert(1);//");
        assert_eq!(request_host(&headers, "localhost"), "localhost");
    }
}
