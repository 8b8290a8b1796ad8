//! Landing page.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("index.html");

/// GET / - Page embedding the live preview
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[cfg(test)]
mod tests {
    use crate::broadcaster::BroadcasterConfig;
    use crate::server::tests::{get, start};

    #[tokio::test]
    async fn test_index_embeds_stream() {
        let server = start(BroadcasterConfig::default(), None).await;
        let response = get(server.addr, "/", "").await;

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.to_ascii_lowercase().contains("content-type: text/html"));
        assert!(response.contains(r#"src="/image""#));
    }
}
