//! Multipart MJPEG stream endpoint.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::broadcaster::ClientHandle;
use crate::encode::MULTIPART_CONTENT_TYPE;
use crate::error::Error;
use crate::server::state::AppState;

/// Owns a client registration for the lifetime of one response body.
///
/// Dropping it, whether the stream ended or hyper dropped the body after a
/// disconnect, unregisters the client.
struct ImageStream {
    client: ClientHandle,
}

impl Drop for ImageStream {
    fn drop(&mut self) {
        tracing::info!(
            client = self.client.id(),
            dropped_frames = self.client.dropped(),
            "Image stream closed"
        );
    }
}

fn frame_stream(
    client: ClientHandle,
    idle_timeout: Option<Duration>,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    futures::stream::unfold(ImageStream { client }, move |stream| async move {
        let next = match idle_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, stream.client.receive()).await {
                Ok(frame) => frame,
                Err(_) => {
                    tracing::info!(client = stream.client.id(), "Image stream idle, closing");
                    None
                }
            },
            None => stream.client.receive().await,
        };
        next.map(|frame| (Ok(frame), stream))
    })
}

/// GET /image - Long-lived `multipart/x-mixed-replace` stream
pub async fn get_image(State(state): State<Arc<AppState>>) -> Response {
    let client = match state.broadcaster.register() {
        Ok(client) => client,
        Err(e @ (Error::TooManyClients(_) | Error::Closed)) => {
            tracing::warn!(%e, "Refusing image stream");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
        Err(e) => {
            tracing::error!(?e, "Failed to register image stream");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    tracing::info!(client = client.id(), "Image stream opened");

    (
        [
            (header::CONTENT_TYPE, MULTIPART_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frame_stream(client, state.idle_timeout)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcaster::BroadcasterConfig;
    use crate::server::tests::{get, read_until, request, start, wait_for_clients};

    fn chunk(tag: &str) -> Bytes {
        Bytes::from(format!(
            "--frame\r\nContent-Type: image/jpeg\r\n\r\n{}\r\n",
            tag
        ))
    }

    #[tokio::test]
    async fn test_stream_headers_and_frames() {
        let server = start(BroadcasterConfig::default(), None).await;
        let mut stream = request(server.addr, "/image", "").await;
        wait_for_clients(&server.broadcaster, 1).await;

        server.broadcaster.broadcast(chunk("FIRST"));
        server.broadcaster.broadcast(chunk("SECOND"));

        let text = read_until(&mut stream, "SECOND").await;
        assert!(text.starts_with("HTTP/1.1 200"));
        assert!(text
            .to_ascii_lowercase()
            .contains("content-type: multipart/x-mixed-replace; boundary=frame"));
        assert!(text.find("FIRST").unwrap() < text.find("SECOND").unwrap());
    }

    #[tokio::test]
    async fn test_every_client_gets_frames() {
        let server = start(BroadcasterConfig::default(), None).await;
        let mut a = request(server.addr, "/image", "").await;
        let mut b = request(server.addr, "/image", "").await;
        wait_for_clients(&server.broadcaster, 2).await;

        server.broadcaster.broadcast(chunk("SHARED"));
        read_until(&mut a, "SHARED").await;
        read_until(&mut b, "SHARED").await;
    }

    #[tokio::test]
    async fn test_disconnect_unregisters_client() {
        let server = start(BroadcasterConfig::default(), None).await;
        let stream = request(server.addr, "/image", "").await;
        let mut other = request(server.addr, "/image", "").await;
        wait_for_clients(&server.broadcaster, 2).await;

        drop(stream);

        // The server notices the broken connection once it writes to it
        for i in 0..200 {
            server.broadcaster.broadcast(chunk(&format!("tick{}", i)));
            if server.broadcaster.client_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(server.broadcaster.client_count(), 1);

        server.broadcaster.broadcast(chunk("AFTER"));
        read_until(&mut other, "AFTER").await;
    }

    #[tokio::test]
    async fn test_client_limit_returns_503() {
        let config = BroadcasterConfig {
            max_clients: Some(1),
            ..Default::default()
        };
        let server = start(config, None).await;
        let _first = request(server.addr, "/image", "").await;
        wait_for_clients(&server.broadcaster, 1).await;

        let response = get(server.addr, "/image", "").await;
        assert!(response.starts_with("HTTP/1.1 503"));
    }

    #[tokio::test]
    async fn test_idle_timeout_ends_stream() {
        let server = start(
            BroadcasterConfig::default(),
            Some(Duration::from_millis(100)),
        )
        .await;
        let _stream = request(server.addr, "/image", "").await;
        wait_for_clients(&server.broadcaster, 1).await;

        tokio::time::sleep(Duration::from_millis(300)).await;
        wait_for_clients(&server.broadcaster, 0).await;
    }
}
