//! Ijah API Server module
//!
//! HTTP REST API over import, export and record entry.
//! Run with `ijah-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
