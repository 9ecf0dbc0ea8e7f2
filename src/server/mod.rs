//! WebSocket chat server: HTTP/WebSocket surface over the engine.

mod handler;
mod runner;
mod signal;
mod state;

pub use runner::{build_router, run_server};
pub use state::AppState;
