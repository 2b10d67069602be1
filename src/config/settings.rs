//! Resolved runtime settings.

use std::path::PathBuf;
use std::time::Duration;

use super::{LocatorConfig, DEFAULT_MAX_PAGES, DEFAULT_MEDIA_URL, DEFAULT_SITE_URL};

/// Settings after merging defaults, config file, environment and flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub site_url: String,
    pub media_url: String,
    /// Raw user agent setting, resolved by the HTTP client.
    pub user_agent: Option<String>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub request_delay: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub max_pages: u32,
    pub jobs: usize,
    pub keep_going: bool,
    pub output_dir: PathBuf,
    pub locators: LocatorConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            media_url: DEFAULT_MEDIA_URL.to_string(),
            user_agent: None,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            request_delay: Duration::ZERO,
            retries: 0,
            retry_delay: Duration::from_secs(2),
            max_pages: DEFAULT_MAX_PAGES,
            jobs: 1,
            keep_going: false,
            output_dir: PathBuf::from("."),
            locators: LocatorConfig::default(),
        }
    }
}

impl Settings {
    /// URL of a collection's landing page.
    pub fn collection_url(&self, collection_id: &str) -> String {
        format!("{}/{}", self.site_url, collection_id)
    }

    /// URL of one listing page of a collection (pages start at 1).
    pub fn listing_url(&self, collection_id: &str, page: u32) -> String {
        format!("{}/{}/{}", self.site_url, collection_id, page)
    }

    /// URL of a video's detail page.
    pub fn video_url(&self, video_id: &str) -> String {
        format!("{}/{}", self.site_url, video_id)
    }

    /// URL of a video's media file.
    pub fn media_file_url(&self, video_id: &str) -> String {
        format!("{}/{}.mp4", self.media_url, video_id)
    }
}
