//! Video metadata from a lecture's detail page.

use super::{ArchiveScraper, PageSource};
use crate::error::{DownloadError, Result};
use crate::identifier::VideoId;

/// What is needed to name and fetch a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub id: VideoId,
    /// Display title, trimmed but not sanitized.
    pub title: String,
}

impl<S: PageSource> ArchiveScraper<S> {
    /// Fetch a video's detail page and read its title.
    ///
    /// A missing title means either the page layout changed or the video
    /// does not exist; both surface as a parse error.
    pub async fn resolve(&self, video: &VideoId) -> Result<VideoInfo> {
        let url = self.settings.video_url(video.as_str());
        let html = self.source.fetch_page(&url).await?;

        let title = self
            .locators
            .lecture_title(&html)
            .ok_or_else(|| DownloadError::parse(&url, "lecture title not found"))?;

        Ok(VideoInfo {
            id: video.clone(),
            title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::scrapers::mock::MockPages;
    use crate::scrapers::Locators;

    fn scraper(pages: MockPages) -> ArchiveScraper<MockPages> {
        ArchiveScraper::new(pages, Locators::default(), Settings::default())
    }

    #[tokio::test]
    async fn test_resolve_reads_title() {
        let pages = MockPages::default().with_page(
            "http://pirsa.org/20200101",
            r#"<html><body>
                <div class="lecture_title">
                    A: Talk? Title
                </div>
                <div class="lecture_info">Speaker</div>
            </body></html>"#,
        );

        let info = scraper(pages)
            .resolve(&"20200101".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(info.id.as_str(), "20200101");
        assert_eq!(info.title, "A: Talk? Title");
    }

    #[tokio::test]
    async fn test_resolve_missing_title_is_parse_error() {
        let pages = MockPages::default().with_page(
            "http://pirsa.org/20200101",
            "<html><body><h1>Page not found</h1></body></html>",
        );

        let err = scraper(pages)
            .resolve(&"20200101".parse().unwrap())
            .await
            .unwrap_err();
        match err {
            DownloadError::Parse { url, message } => {
                assert_eq!(url, "http://pirsa.org/20200101");
                assert!(message.contains("title"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_fetch_failure_is_network_error() {
        let err = scraper(MockPages::default())
            .resolve(&"20200101".parse().unwrap())
            .await
            .unwrap_err();
        assert!(err.is_network());
    }
}
