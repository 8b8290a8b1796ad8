//! One-producer, many-consumer fan-out of encoded frames.
//!
//! Every HTTP client streaming `/image` owns one bounded delivery queue.
//! The producer loop calls [`FrameBroadcaster::broadcast`] once per frame,
//! which pushes the payload into every queue registered at that moment
//! without ever waiting on a consumer.
//!
//! When a queue is full the oldest frame is discarded, so a stalled client
//! falls behind by at most `queue_capacity` frames and only ever affects
//! itself.

use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::Notify;

use crate::error::{Error, Result};

/// Opaque identifier of a registered client.
pub type ClientId = u64;

/// Configuration for the frame broadcaster.
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Frames buffered per client before the oldest is dropped (default: 8).
    pub queue_capacity: usize,

    /// Maximum number of simultaneous clients. `None` means unlimited.
    pub max_clients: Option<usize>,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 8,
            max_clients: None,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct QueueState {
    frames: VecDeque<Bytes>,
    closed: bool,
    dropped: u64,
}

/// Delivery queue of a single client.
struct ClientQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl ClientQueue {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                frames: VecDeque::with_capacity(capacity),
                ..Default::default()
            }),
            notify: Notify::new(),
        }
    }

    /// Appends a frame. Returns `true` if the oldest frame had to be dropped.
    fn push(&self, payload: Bytes, capacity: usize) -> bool {
        let overflowed = {
            let mut state = lock(&self.state);
            if state.closed {
                return false;
            }
            let overflowed = state.frames.len() >= capacity;
            if overflowed {
                state.frames.pop_front();
                state.dropped += 1;
            }
            state.frames.push_back(payload);
            overflowed
        };
        // A single consumer waits per queue; a stored permit covers the
        // window between its empty check and its wait.
        self.notify.notify_one();
        overflowed
    }

    fn close(&self) {
        lock(&self.state).closed = true;
        self.notify.notify_one();
    }
}

/// Registry of client queues with broadcast delivery.
pub struct FrameBroadcaster {
    config: BroadcasterConfig,
    clients: Mutex<HashMap<ClientId, Arc<ClientQueue>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl FrameBroadcaster {
    pub fn new(config: BroadcasterConfig) -> Arc<Self> {
        Arc::new(Self {
            config: BroadcasterConfig {
                queue_capacity: config.queue_capacity.max(1),
                ..config
            },
            clients: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    /// Registers a new client and returns its receiving handle.
    ///
    /// The client is unregistered when the handle is dropped.
    pub fn register(self: &Arc<Self>) -> Result<ClientHandle> {
        let queue = Arc::new(ClientQueue::new(self.config.queue_capacity));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let count = {
            let mut clients = lock(&self.clients);
            if self.closed.load(Ordering::SeqCst) {
                return Err(Error::Closed);
            }
            if let Some(max) = self.config.max_clients {
                if clients.len() >= max {
                    tracing::warn!(max_clients = max, "Rejecting client, limit reached");
                    return Err(Error::TooManyClients(max));
                }
            }
            clients.insert(id, Arc::clone(&queue));
            clients.len()
        };

        tracing::debug!(client = id, clients = count, "Client registered");
        Ok(ClientHandle {
            id,
            queue,
            broadcaster: Arc::downgrade(self),
        })
    }

    /// Removes a client from the registry.
    ///
    /// Returns `false` if the client was not registered; calling this twice
    /// for the same id is harmless.
    pub fn unregister(&self, id: ClientId) -> bool {
        let (removed, count) = {
            let mut clients = lock(&self.clients);
            (clients.remove(&id), clients.len())
        };

        match removed {
            Some(queue) => {
                queue.close();
                tracing::debug!(client = id, clients = count, "Client unregistered");
                true
            }
            None => false,
        }
    }

    /// Delivers `payload` to every registered client.
    ///
    /// Never blocks on a consumer. Returns the number of clients reached.
    pub fn broadcast(&self, payload: Bytes) -> usize {
        let clients = lock(&self.clients);
        for (id, queue) in clients.iter() {
            if queue.push(payload.clone(), self.config.queue_capacity) {
                tracing::debug!(client = id, "Client queue full, dropped oldest frame");
            }
        }
        clients.len()
    }

    pub fn client_count(&self) -> usize {
        lock(&self.clients).len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Closes every client queue and rejects further registrations.
    ///
    /// Consumers drain what is already queued, then see end of stream.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let drained: Vec<_> = lock(&self.clients).drain().collect();
        for (_, queue) in &drained {
            queue.close();
        }
        tracing::info!(clients = drained.len(), "Broadcaster closed");
    }
}

/// Receiving side of a client registration.
pub struct ClientHandle {
    id: ClientId,
    queue: Arc<ClientQueue>,
    broadcaster: Weak<FrameBroadcaster>,
}

impl ClientHandle {
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Waits for the next frame.
    ///
    /// Returns `None` once the client was unregistered or the broadcaster
    /// closed and every queued frame has been consumed.
    pub async fn receive(&self) -> Option<Bytes> {
        loop {
            {
                let mut state = lock(&self.queue.state);
                if let Some(frame) = state.frames.pop_front() {
                    return Some(frame);
                }
                if state.closed {
                    return None;
                }
            }
            self.queue.notify.notified().await;
        }
    }

    /// Pops the next frame without waiting.
    pub fn try_receive(&self) -> Option<Bytes> {
        lock(&self.queue.state).frames.pop_front()
    }

    /// Number of frames discarded because this client fell behind.
    pub fn dropped(&self) -> u64 {
        lock(&self.queue.state).dropped
    }

    /// Unregisters this client now rather than on drop.
    pub fn unregister(&self) -> bool {
        match self.broadcaster.upgrade() {
            Some(broadcaster) => broadcaster.unregister(self.id),
            None => false,
        }
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        self.unregister();
        self.queue.close();
    }
}
