//! Services that turn archive pages into downloaded files.

pub mod download;
pub mod orchestrator;

pub use download::{DownloadEvent, DownloadSummary, DownloadTarget, MediaFetcher, ProgressObserver};
pub use orchestrator::{FailurePolicy, Orchestrator, RunReport};
