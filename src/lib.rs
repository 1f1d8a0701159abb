//! Gallica Fetcher Library
//!
//! Downloads documents from the Gallica digital library (BnF) through the IIIF
//! APIs and assembles their pages into a single PDF. Handles the archive's
//! intermittent access refusals with session warm-up, manifest discovery
//! fallbacks and bounded retry with backoff.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
