//! Core types and utilities for the FX rates push server
//!
//! This crate provides shared types used across all components:
//! - Rate snapshot and currency rate definitions
//! - Server, upstream and poller configuration
//! - Error taxonomy

pub mod config;
pub mod errors;
pub mod rates;

pub use config::*;
pub use errors::*;
pub use rates::*;
