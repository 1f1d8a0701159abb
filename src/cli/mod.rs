//! Command-line interface components
//!
//! This module contains CLI-specific code for the Gallica Fetcher application:
//! argument parsing, the fetch command handler and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, FetchArgs, GlobalArgs};
pub use commands::{build_fetch_config, handle_fetch};
pub use progress::{ProgressConfig, ProgressDisplay};
