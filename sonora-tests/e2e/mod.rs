//! End-to-end tests for Sonora
//!
//! These tests drive the full HTTP router in-process: routing, range parsing,
//! format selection, windowing and byte delivery from files on disk.

mod support;

mod account_workflow;
mod error_responses;
mod streaming_workflow;
