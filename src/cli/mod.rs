//! Command-line interface for pirsa-dl.

mod commands;
pub mod progress;

pub use commands::{exit_code, is_verbose, run};
