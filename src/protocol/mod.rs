//! Wire protocol DTOs.
//!
//! Every WebSocket frame is a JSON envelope `{"event": ..., "data": ...}`;
//! payload field names are camelCase to match the existing clients.
//!
//! - `client`: client-to-server events
//! - `server`: server-to-client events and HTTP response DTOs

pub mod client;
pub mod server;

pub use client::ClientEvent;
pub use server::ServerEvent;
