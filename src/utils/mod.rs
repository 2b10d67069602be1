//! Shared utility functions.
//!
//! - `filename`: turning display titles into path segments
//! - `format`: human-readable formatting (sizes, display names)

mod filename;
mod format;

pub use filename::{sanitize, segment_or};
pub use format::{format_size, truncate_display_name};
