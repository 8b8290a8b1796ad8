//! Shared application state for the HTTP server.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::broadcaster::FrameBroadcaster;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Fan-out of encoded frames to `/image` clients.
    pub broadcaster: Arc<FrameBroadcaster>,

    /// Idle timeout applied to each `/image` stream.
    pub idle_timeout: Option<Duration>,

    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates new app state around the given broadcaster.
    pub fn new(broadcaster: Arc<FrameBroadcaster>, idle_timeout: Option<Duration>) -> Self {
        Self {
            broadcaster,
            idle_timeout,
            started_at: Utc::now(),
        }
    }
}
