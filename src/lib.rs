//! Room-based WebSocket chat server library.
//!
//! Clients connect over WebSocket, pick a nickname, and either chat in the
//! shared lobby or create/join password-optional named rooms. The engine
//! tracks connections, nicknames, and room membership, and fans out chat
//! messages and presence snapshots to the affected audiences.

pub mod common;
pub mod domain;
pub mod engine;
pub mod protocol;
pub mod server;
