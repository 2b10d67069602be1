//! Readers for the PIRSA archive's pages.
//!
//! `ArchiveScraper` combines a [`PageSource`] with the page [`Locators`];
//! collection enumeration lives in `collection`, video metadata in `video`.

pub mod collection;
mod http_client;
pub mod locators;
pub mod retry;
pub mod video;

pub use collection::{CollectionResult, ListingPage};
pub use http_client::{HttpClient, HttpResponse, USER_AGENT};
pub use locators::Locators;
pub use retry::RetryPolicy;
pub use video::VideoInfo;

use async_trait::async_trait;

use crate::config::Settings;
use crate::error::Result;

/// Anything that can fetch an archive page as text.
///
/// A non-success status or transport failure must surface as a
/// `Network` error; the body of a successful response is returned as-is.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Reads collections and videos from the archive.
pub struct ArchiveScraper<S> {
    source: S,
    locators: Locators,
    settings: Settings,
}

impl<S: PageSource> ArchiveScraper<S> {
    pub fn new(source: S, locators: Locators, settings: Settings) -> Self {
        Self {
            source,
            locators,
            settings,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
