//! GLANCE HTTP API.

pub mod error;
pub mod health;
pub mod scan;
pub mod search;
pub mod server;

pub use server::{router, serve, start_server, AppState};
