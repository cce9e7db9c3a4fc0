//! HTTP API - the narrow task surface of the engine.
//!
//! Submit a task, fetch it, list recent tasks, cancel a running one. No
//! auth, no pages; dashboards and forms live elsewhere.

mod routes;
mod runner;

pub use routes::{serve, AppState};
