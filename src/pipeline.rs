//! Demo pipeline: send -> relay -> receive.
//!
//! Every stage runs in its own task, linked by bounded channels. Closing
//! the source ends the relay, which ends the receive loop.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::broadcaster::FrameBroadcaster;
use crate::config::AppConfig;
use crate::elements::receive::{self, ReceiveStats};
use crate::elements::{relay, send};
use crate::error::{Error, Result};

/// Resolves once `shutdown` flips to `true` or its sender goes away.
pub async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// A started pipeline.
pub struct RunningPipeline {
    /// Address the preview server is bound to.
    pub addr: SocketAddr,
    pub broadcaster: Arc<FrameBroadcaster>,
    shutdown: watch::Receiver<bool>,
    send: JoinHandle<Result<u64>>,
    relay: JoinHandle<Result<u64>>,
    receive: JoinHandle<Result<ReceiveStats>>,
    server: JoinHandle<()>,
}

/// Starts the preview server and every pipeline stage.
pub async fn start(config: &AppConfig, shutdown: watch::Receiver<bool>) -> Result<RunningPipeline> {
    let broadcaster = FrameBroadcaster::new(config.broadcaster.clone());

    let (addr, server) = receive::startup(
        &config.server,
        Arc::clone(&broadcaster),
        wait_for_shutdown(shutdown.clone()),
    )
    .await?;

    let (source_tx, source_rx) = mpsc::channel(config.pipeline_capacity);
    let (relay_tx, relay_rx) = mpsc::channel(config.pipeline_capacity);

    let send = tokio::spawn(send::run(config.send.clone(), source_tx));
    let relay = tokio::spawn(relay::run(source_rx, relay_tx));
    let receive = tokio::spawn(receive::run(
        relay_rx,
        Arc::clone(&broadcaster),
        config.receive.clone(),
    ));

    tracing::info!(%addr, "Pipeline started");
    Ok(RunningPipeline {
        addr,
        broadcaster,
        shutdown,
        send,
        relay,
        receive,
        server,
    })
}

fn joined<T>(result: std::result::Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    result.map_err(|e| Error::Task(e.to_string()))?
}

impl RunningPipeline {
    /// Runs until shutdown is requested, then drains every stage.
    ///
    /// If the source fails, the other stages are aborted and the broadcaster
    /// is closed before the error is returned.
    pub async fn join(self) -> Result<ReceiveStats> {
        let RunningPipeline {
            broadcaster,
            shutdown,
            mut send,
            relay,
            receive,
            server,
            ..
        } = self;

        let sent = tokio::select! {
            result = &mut send => match joined(result) {
                Ok(sent) => Some(sent),
                Err(e) => {
                    tracing::error!(error = %e, "Send element failed, stopping pipeline");
                    relay.abort();
                    receive.abort();
                    server.abort();
                    broadcaster.close();
                    return Err(e);
                }
            },
            _ = wait_for_shutdown(shutdown) => {
                // Dropping the source's sender lets the downstream stages finish
                send.abort();
                None
            }
        };

        let relayed = joined(relay.await)?;
        let stats = joined(receive.await)?;
        if server.await.is_err() {
            tracing::warn!("Preview server task panicked");
        }

        tracing::info!(
            sent = ?sent,
            relayed,
            broadcast = stats.frames_broadcast,
            "Pipeline stopped"
        );
        Ok(stats)
    }
}
