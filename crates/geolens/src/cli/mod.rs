//! Command handlers for the `geolens` binary.

pub mod analyze;
pub mod config;
