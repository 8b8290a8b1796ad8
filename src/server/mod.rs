//! HTTP preview server.
//!
//! Serves the multipart `/image` stream fed by the frame broadcaster, the
//! `/config` descriptor consumed by preview frontends, and a landing page.

pub mod routes;
pub mod state;

use crate::error::Result;
use crate::server::routes::{config, health, image, index};
use crate::server::state::AppState;

use axum::http::{header, Method};
use axum::{routing::get, Router};
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Default server port.
pub const DEFAULT_PORT: u16 = 8090;

/// Configuration for the preview server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind (default: all interfaces).
    pub host: IpAddr,

    /// Port to bind. Zero picks a free port.
    pub port: u16,

    /// End an `/image` stream when no frame arrives for this long.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            idle_timeout: None,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Builds the router.
pub fn router(state: Arc<AppState>) -> Router {
    // Only the descriptor is meant for cross-origin frontends
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    let config_routes = Router::new()
        .route("/config", get(config::get_config))
        .layer(cors);

    Router::new()
        .route("/", get(index::index))
        .route("/image", get(image::get_image))
        .route("/health", get(health::health_check))
        .merge(config_routes)
        .with_state(state)
}

/// Binds the listening socket.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener> {
    let listener = TcpListener::bind(config.addr()).await?;
    tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Runs the axum server until `shutdown` resolves.
///
/// On shutdown the broadcaster is closed so open `/image` streams end and
/// the graceful shutdown can complete.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let broadcaster = Arc::clone(&state.broadcaster);
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("HTTP server shutting down");
            broadcaster.close();
        })
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::broadcaster::{BroadcasterConfig, FrameBroadcaster};
    use bytes::Bytes;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    pub(crate) struct TestServer {
        pub addr: SocketAddr,
        pub broadcaster: Arc<FrameBroadcaster>,
        pub shutdown: Option<oneshot::Sender<()>>,
        pub task: JoinHandle<Result<()>>,
    }

    pub(crate) async fn start(config: BroadcasterConfig, idle: Option<Duration>) -> TestServer {
        let server_config = ServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            idle_timeout: idle,
        };
        let listener = bind(&server_config).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let broadcaster = FrameBroadcaster::new(config);
        let state = Arc::new(AppState::new(Arc::clone(&broadcaster), idle));

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(serve(listener, state, async move {
            let _ = rx.await;
        }));

        TestServer {
            addr,
            broadcaster,
            shutdown: Some(tx),
            task,
        }
    }

    pub(crate) async fn request(addr: SocketAddr, path: &str, extra: &str) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let req = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n{}\r\n",
            path, extra
        );
        stream.write_all(req.as_bytes()).await.unwrap();
        stream
    }

    pub(crate) async fn get(addr: SocketAddr, path: &str, extra: &str) -> String {
        let mut stream = request(addr, path, extra).await;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Reads from `stream` until `needle` shows up.
    pub(crate) async fn read_until(stream: &mut TcpStream, needle: &str) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before {:?}", needle);
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if text.contains(needle) {
                return text.into_owned();
            }
        }
    }

    pub(crate) async fn wait_for_clients(broadcaster: &FrameBroadcaster, count: usize) {
        for _ in 0..200 {
            if broadcaster.client_count() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} clients, have {}",
            count,
            broadcaster.client_count()
        );
    }

    #[tokio::test]
    async fn test_graceful_shutdown_ends_streams() {
        let mut server = start(BroadcasterConfig::default(), None).await;
        let mut stream = request(server.addr, "/image", "").await;
        wait_for_clients(&server.broadcaster, 1).await;

        server.broadcaster.broadcast(Bytes::from_static(b"--frame\r\nlast\r\n"));
        read_until(&mut stream, "last").await;

        server.shutdown.take().unwrap().send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), server.task)
            .await
            .expect("server did not shut down")
            .unwrap();

        assert!(result.is_ok());
        assert!(server.broadcaster.is_closed());
        assert_eq!(server.broadcaster.client_count(), 0);
    }
}
