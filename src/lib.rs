//! Convid - batch video converter
//!
//! This library crate exposes the core functionality for integration testing.

pub mod batch;
pub mod config;
pub mod probe;
pub mod report;
