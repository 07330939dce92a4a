//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod completion_worker;

// Re-export main functions
pub use completion_worker::{drain_completion_worker, spawn_completion_worker};
