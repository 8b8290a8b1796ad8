//! Preview descriptor endpoint.

use axum::Json;
use serde::Serialize;

/// Tells a frontend where to find the preview stream.
#[derive(Debug, Serialize)]
pub struct PreviewConfig {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub endpoint: &'static str,
}

/// GET /config - Preview descriptor
pub async fn get_config() -> Json<PreviewConfig> {
    Json(PreviewConfig {
        kind: "preview",
        endpoint: "/image",
    })
}
