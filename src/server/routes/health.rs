//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of connected `/image` clients.
    pub clients: usize,
    pub started_at: String,
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.broadcaster.is_closed() {
            "closing"
        } else {
            "ok"
        },
        clients: state.broadcaster.client_count(),
        started_at: state.started_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use crate::broadcaster::BroadcasterConfig;
    use crate::server::tests::{get, start};

    #[tokio::test]
    async fn test_health_reports_clients() {
        let server = start(BroadcasterConfig::default(), None).await;
        let _client = server.broadcaster.register().unwrap();

        let response = get(server.addr, "/health", "").await;
        let body = response.split("\r\n\r\n").nth(1).unwrap();
        let json: serde_json::Value = serde_json::from_str(body).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["clients"], 1);
        assert!(chrono::DateTime::parse_from_rfc3339(json["started_at"].as_str().unwrap()).is_ok());
    }
}
