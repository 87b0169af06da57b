// Application state module
// Shared, read-only state handed to every request

use std::sync::Arc;
use std::time::Instant;

use super::types::Config;
use crate::clock::{Clock, SystemClock};
use crate::store::ItemStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ItemStore>,
    pub clock: Arc<dyn Clock>,
    /// Process start, for the health endpoint's uptime
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ItemStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, store: Arc<dyn ItemStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store,
            clock,
            started_at: Instant::now(),
        }
    }
}
