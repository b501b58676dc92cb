//! Autoflow CLI library
//!
//! The binary in `main.rs` is a thin wrapper; everything testable lives
//! here so integration tests can drive the same paths.

pub mod cli;
pub mod config;
