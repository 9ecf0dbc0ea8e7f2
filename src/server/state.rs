//! Shared application state.

use tokio::sync::Mutex;

use crate::engine::ChatService;

/// Shared application state.
///
/// One mutex over the whole engine: each inbound event locks, mutates, and
/// performs all of its broadcasts before releasing, so no two logical
/// operations ever interleave.
pub struct AppState {
    pub service: Mutex<ChatService>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            service: Mutex::new(ChatService::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
