//! Downloader for the PIRSA seminar archive.
//!
//! [`identifier::classify`] turns user input into a video or collection ID,
//! [`scrapers::ArchiveScraper`] reads titles and listings from the archive's
//! HTML, and [`services::Orchestrator`] streams the media files to disk.

pub mod config;
pub mod error;
pub mod identifier;
pub mod scrapers;
pub mod services;
pub mod utils;
