//! Sonora Web - JSON API and audio streaming server

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Serves byte-range audio streams for progressive and continuous clients,
//! plus song metadata and preference endpoints over JSON.

pub mod error;
pub mod handlers;
pub mod server;

// Re-export main types
pub use error::ApiError;
pub use server::{AppState, build_router, run_server};
