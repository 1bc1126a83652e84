//! Vertical search demo service library.
//!
//! This library exposes the core modules for integration testing while
//! keeping the actual binary entry point in main.rs.

pub mod clients;
pub mod config;
pub mod error;
pub mod metrics;
pub mod render;
pub mod search;
pub mod server;
