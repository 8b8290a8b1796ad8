//! Multi-client receive element.
//!
//! Encodes every incoming frame as a multipart JPEG chunk and hands it to
//! the [`FrameBroadcaster`] that backs the `/image` endpoint.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::uuid;

use crate::broadcaster::FrameBroadcaster;
use crate::elements::{ElementDescriptor, ElementKind};
use crate::encode::{encode_multipart_chunk, DEFAULT_QUALITY};
use crate::error::Result;
use crate::frame::Frame;
use crate::server::{self, state::AppState, ServerConfig};

pub const DESCRIPTOR: ElementDescriptor = ElementDescriptor {
    id: uuid!("9ebdfcbb-2dbb-4c67-aa6b-02820feb55d9"),
    name: "simple_receive",
    display_name: "Simple Receive",
    version: "0.3.0",
    framework_version: Some("0.6"),
    kind: ElementKind::Sink,
};

/// Settings for the receive element.
#[derive(Debug, Clone)]
pub struct ReceiveSettings {
    /// JPEG quality, 1-100 (default: 80).
    pub jpeg_quality: u8,
}

impl Default for ReceiveSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_QUALITY,
        }
    }
}

/// Counters reported when the executor finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveStats {
    pub frames_in: u64,
    pub frames_broadcast: u64,
    /// Frames skipped because nobody was watching.
    pub frames_skipped: u64,
    pub encode_errors: u64,
}

/// Starts the preview server in the background.
///
/// Returns the bound address and the server task. The server stops, and
/// closes the broadcaster, once `shutdown` resolves.
pub async fn startup<F>(
    config: &ServerConfig,
    broadcaster: Arc<FrameBroadcaster>,
    shutdown: F,
) -> Result<(SocketAddr, JoinHandle<()>)>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!("Starting Element: Multi-client Receive");

    let listener = server::bind(config).await?;
    let addr = listener.local_addr()?;
    let state = Arc::new(AppState::new(broadcaster, config.idle_timeout));

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state, shutdown).await {
            tracing::error!(?e, "Preview server failed");
        }
    });

    Ok((addr, handle))
}

/// Encodes and broadcasts frames until the upstream channel closes.
pub async fn run(
    mut input: mpsc::Receiver<Frame>,
    broadcaster: Arc<FrameBroadcaster>,
    settings: ReceiveSettings,
) -> Result<ReceiveStats> {
    let mut stats = ReceiveStats::default();

    while let Some(frame) = input.recv().await {
        stats.frames_in += 1;

        if broadcaster.client_count() == 0 {
            stats.frames_skipped += 1;
            continue;
        }

        let quality = settings.jpeg_quality;
        let encoded =
            tokio::task::spawn_blocking(move || encode_multipart_chunk(&frame, quality)).await;

        match encoded {
            Ok(Ok(chunk)) => {
                broadcaster.broadcast(chunk);
                stats.frames_broadcast += 1;
            }
            Ok(Err(e)) => {
                stats.encode_errors += 1;
                tracing::warn!(%e, frame = stats.frames_in, "Failed to encode frame, skipping");
            }
            Err(e) => {
                stats.encode_errors += 1;
                tracing::warn!(?e, frame = stats.frames_in, "Encoder task failed, skipping");
            }
        }
    }

    tracing::info!(
        frames_in = stats.frames_in,
        frames_broadcast = stats.frames_broadcast,
        encode_errors = stats.encode_errors,
        "Receive element stopped, upstream closed"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcaster::BroadcasterConfig;
    use crate::frame::ColorFormat;

    #[tokio::test]
    async fn test_broadcasts_encoded_frames() {
        let broadcaster = FrameBroadcaster::new(BroadcasterConfig::default());
        let client = broadcaster.register().unwrap();
        let (tx, rx) = mpsc::channel(4);

        tx.send(Frame::solid(32, 16, [255, 0, 0], ColorFormat::Rgb))
            .await
            .unwrap();
        drop(tx);

        let stats = run(rx, Arc::clone(&broadcaster), ReceiveSettings::default())
            .await
            .unwrap();
        assert_eq!(stats.frames_broadcast, 1);

        let chunk = client.try_receive().unwrap();
        assert!(chunk.starts_with(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_encode_failure_does_not_stop_stream() {
        let broadcaster = FrameBroadcaster::new(BroadcasterConfig::default());
        let client = broadcaster.register().unwrap();
        let (tx, rx) = mpsc::channel(4);

        let mut broken = Frame::solid(32, 16, [0, 0, 0], ColorFormat::Rgb);
        broken.pixels.truncate(5);
        tx.send(broken).await.unwrap();
        tx.send(Frame::solid(32, 16, [0, 0, 0], ColorFormat::Rgb))
            .await
            .unwrap();
        drop(tx);

        let stats = run(rx, Arc::clone(&broadcaster), ReceiveSettings::default())
            .await
            .unwrap();
        assert_eq!(stats.frames_in, 2);
        assert_eq!(stats.encode_errors, 1);
        assert_eq!(stats.frames_broadcast, 1);

        assert!(client.try_receive().is_some());
        assert!(client.try_receive().is_none());
    }

    #[tokio::test]
    async fn test_skips_encoding_without_clients() {
        let broadcaster = FrameBroadcaster::new(BroadcasterConfig::default());
        let (tx, rx) = mpsc::channel(4);
        tx.send(Frame::solid(8, 8, [0, 0, 0], ColorFormat::Rgb))
            .await
            .unwrap();
        drop(tx);

        let stats = run(rx, broadcaster, ReceiveSettings::default())
            .await
            .unwrap();
        assert_eq!(stats.frames_skipped, 1);
        assert_eq!(stats.frames_broadcast, 0);
    }
}
