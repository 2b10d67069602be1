//! Collection enumeration.
//!
//! A collection's landing page carries its name; its listing pages
//! (`{collection}/1`, `{collection}/2`, ...) carry the video IDs. Pages are
//! walked in order until the first page that lists no videos.

use std::sync::OnceLock;

use futures::{Stream, TryStreamExt};
use regex::Regex;

use super::{ArchiveScraper, PageSource};
use crate::error::{DownloadError, Result};
use crate::identifier::{CollectionId, VideoId};
use crate::utils::segment_or;

/// A collection's name and the videos it lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionResult {
    /// Sanitized name, usable as a directory name.
    pub name: String,
    /// Video IDs in page-then-position order. May contain repeats.
    pub video_ids: Vec<VideoId>,
}

/// One non-empty listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// 1-based page index.
    pub index: u32,
    pub video_ids: Vec<VideoId>,
}

/// Matches labels like `PIRSA:C00042 - ` in front of collection names.
fn label_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{5}:C[0-9]{5}\s-(\s|$)").expect("label pattern is valid"))
}

/// Directory-safe collection name from the raw heading text.
pub fn collection_dir_name(heading: &str, collection: &CollectionId) -> String {
    let name = label_prefix().replace(heading.trim_start(), "");
    segment_or(name.trim(), collection.as_str())
}

impl<S: PageSource> ArchiveScraper<S> {
    /// Fetch the collection's name and every video ID it lists.
    ///
    /// Fails on the first page that cannot be fetched; a partial listing is
    /// never returned as complete.
    pub async fn enumerate(&self, collection: &CollectionId) -> Result<CollectionResult> {
        let url = self.settings.collection_url(collection.as_str());
        let html = self.source.fetch_page(&url).await?;
        let heading = self
            .locators
            .collection_name(&html)
            .ok_or_else(|| DownloadError::parse(&url, "collection name heading not found"))?;
        let name = collection_dir_name(&heading, collection);

        let mut pages = std::pin::pin!(self.listing_pages(collection));
        let mut video_ids = Vec::new();
        while let Some(page) = pages.try_next().await? {
            video_ids.extend(page.video_ids);
        }

        tracing::info!(
            "Collection {} ({}) lists {} videos",
            collection,
            name,
            video_ids.len()
        );

        Ok(CollectionResult { name, video_ids })
    }

    /// Lazily walk the listing pages of a collection, starting at page 1.
    ///
    /// The stream ends at the first page without video IDs (that page is not
    /// yielded). An error is yielded once and ends the stream. Calling this
    /// again restarts from page 1.
    pub fn listing_pages<'a>(
        &'a self,
        collection: &'a CollectionId,
    ) -> impl Stream<Item = Result<ListingPage>> + 'a {
        futures::stream::try_unfold(1u32, move |index| async move {
            if index > self.settings.max_pages {
                return Err(DownloadError::parse(
                    &self.settings.collection_url(collection.as_str()),
                    format!(
                        "listing did not terminate within {} pages",
                        self.settings.max_pages
                    ),
                ));
            }

            let page = self.listing_page(collection, index).await?;
            if page.video_ids.is_empty() {
                tracing::debug!("Collection {} ends before page {}", collection, index);
                return Ok(None);
            }

            Ok(Some((page, index + 1)))
        })
    }

    /// Fetch a single listing page.
    pub async fn listing_page(&self, collection: &CollectionId, index: u32) -> Result<ListingPage> {
        let url = self.settings.listing_url(collection.as_str(), index);
        let html = self.source.fetch_page(&url).await?;

        let video_ids = self
            .locators
            .listing_ids(&html)
            .into_iter()
            .map(|raw| {
                raw.parse::<VideoId>().map_err(|_| {
                    DownloadError::parse(&url, format!("listing entry '{}' is not a video ID", raw))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("{}: {} videos", url, video_ids.len());
        Ok(ListingPage { index, video_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::scrapers::mock::MockPages;
    use crate::scrapers::Locators;
    use futures::StreamExt;

    const SITE: &str = "http://pirsa.org";

    fn listing(ids: &[&str]) -> String {
        let blocks: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<div class="search_results"><div><b>{}</b><a href="/{}">Talk</a></div></div>"#,
                    id, id
                )
            })
            .collect();
        format!("<html><body>{}</body></html>", blocks)
    }

    fn scraper(pages: MockPages) -> ArchiveScraper<MockPages> {
        ArchiveScraper::new(pages, Locators::default(), Settings::default())
    }

    fn collection(id: &str) -> CollectionId {
        id.parse().unwrap()
    }

    #[test]
    fn test_collection_dir_name_strips_label() {
        let id = collection("C00042");
        assert_eq!(
            collection_dir_name("ABCDE:C00042 - My Series", &id),
            "My-Series"
        );
        assert_eq!(
            collection_dir_name("  PIRSA:C00042 - Quantum: Gravity?  ", &id),
            "Quantum-Gravity-"
        );
        assert_eq!(collection_dir_name("Plain Name", &id), "Plain-Name");
        // Labels elsewhere in the name are left alone
        assert_eq!(
            collection_dir_name("Talks ABCDE:C00042 - x", &id),
            "Talks-ABCDE-C00042-x"
        );
        assert_eq!(collection_dir_name("ABCDE:C00042 - ", &id), "C00042");
    }

    #[test]
    fn test_label_digits_must_be_ascii() {
        let id = collection("C00042");
        assert_eq!(
            collection_dir_name("ABCDE:C٠٠٠٤٢ - My Series", &id),
            "ABCDE-C٠٠٠٤٢-My-Series"
        );
    }

    #[tokio::test]
    async fn test_enumerate_stops_at_first_empty_page() {
        let pages = MockPages::default()
            .with_page(&format!("{SITE}/C00042"), "<h3>ABCDE:C00042 - My Series</h3>")
            .with_page(&format!("{SITE}/C00042/1"), &listing(&["20200101", "20200102"]))
            .with_page(&format!("{SITE}/C00042/2"), &listing(&["20200103"]))
            .with_page(&format!("{SITE}/C00042/3"), &listing(&["20200104", "20200105"]))
            .with_page(&format!("{SITE}/C00042/4"), &listing(&[]))
            // Never reached: enumeration ends at the empty page
            .with_page(&format!("{SITE}/C00042/5"), &listing(&["20200199"]));
        let scraper = scraper(pages);

        let result = scraper.enumerate(&collection("C00042")).await.unwrap();
        assert_eq!(result.name, "My-Series");
        let ids: Vec<&str> = result.video_ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["20200101", "20200102", "20200103", "20200104", "20200105"]
        );

        let listing_fetches: Vec<String> = scraper
            .source()
            .requests()
            .into_iter()
            .filter(|url| url.starts_with(&format!("{SITE}/C00042/")))
            .collect();
        assert_eq!(listing_fetches.len(), 4);
    }

    #[tokio::test]
    async fn test_enumerate_empty_collection() {
        let pages = MockPages::default()
            .with_page(&format!("{SITE}/C00007"), "<h3>PIRSA:C00007 - Empty Series</h3>")
            .with_page(
                &format!("{SITE}/C00007/1"),
                "<html><body><p>No results found</p></body></html>",
            );
        let scraper = scraper(pages);

        let result = scraper.enumerate(&collection("C00007")).await.unwrap();
        assert_eq!(result.name, "Empty-Series");
        assert!(result.video_ids.is_empty());
        assert_eq!(scraper.source().requests().len(), 2);
    }

    #[tokio::test]
    async fn test_enumerate_keeps_duplicates_in_order() {
        let pages = MockPages::default()
            .with_page(&format!("{SITE}/C00001"), "<h3>Repeats</h3>")
            .with_page(&format!("{SITE}/C00001/1"), &listing(&["20200101", "20200102"]))
            .with_page(&format!("{SITE}/C00001/2"), &listing(&["20200102"]))
            .with_page(&format!("{SITE}/C00001/3"), &listing(&[]));

        let result = scraper(pages)
            .enumerate(&collection("C00001"))
            .await
            .unwrap();
        let ids: Vec<&str> = result.video_ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["20200101", "20200102", "20200102"]);
    }

    #[tokio::test]
    async fn test_failed_page_aborts_enumeration() {
        // Page 2 is missing, so the mock answers with a network error
        let pages = MockPages::default()
            .with_page(&format!("{SITE}/C00042"), "<h3>Series</h3>")
            .with_page(&format!("{SITE}/C00042/1"), &listing(&["20200101"]));

        let err = scraper(pages)
            .enumerate(&collection("C00042"))
            .await
            .unwrap_err();
        match err {
            DownloadError::Network { url, .. } => assert_eq!(url, format!("{SITE}/C00042/2")),
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_heading_is_parse_error() {
        let pages = MockPages::default()
            .with_page(&format!("{SITE}/C00042"), "<html><body>Maintenance</body></html>");

        let err = scraper(pages)
            .enumerate(&collection("C00042"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_malformed_listing_entry_is_parse_error() {
        let pages = MockPages::default()
            .with_page(&format!("{SITE}/C00042"), "<h3>Series</h3>")
            .with_page(&format!("{SITE}/C00042/1"), &listing(&["PIRSA:2020"]));

        let err = scraper(pages)
            .enumerate(&collection("C00042"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'PIRSA:2020'"), "{}", err);
    }

    #[tokio::test]
    async fn test_listing_stream_is_lazy_and_restartable() {
        let pages = MockPages::default()
            .with_page(&format!("{SITE}/C00042/1"), &listing(&["20200101"]))
            .with_page(&format!("{SITE}/C00042/2"), &listing(&[]));
        let scraper = scraper(pages);
        let id = collection("C00042");

        {
            let mut stream = std::pin::pin!(scraper.listing_pages(&id));
            assert!(scraper.source().requests().is_empty());

            let first = stream.next().await.unwrap().unwrap();
            assert_eq!(first.index, 1);
            assert_eq!(scraper.source().requests().len(), 1);
            assert!(stream.next().await.is_none());
        }

        let again: Vec<ListingPage> = scraper.listing_pages(&id).try_collect().await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].video_ids[0].as_str(), "20200101");
    }

    #[tokio::test]
    async fn test_listing_that_never_ends_is_bounded() {
        let mut pages = MockPages::default();
        for index in 1..=3 {
            pages = pages.with_page(&format!("{SITE}/C00042/{index}"), &listing(&["20200101"]));
        }
        let settings = Settings {
            max_pages: 3,
            ..Settings::default()
        };
        let scraper = ArchiveScraper::new(pages, Locators::default(), settings);

        let result: Result<Vec<ListingPage>> = scraper
            .listing_pages(&collection("C00042"))
            .try_collect()
            .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("did not terminate"), "{}", err);
        assert_eq!(scraper.source().requests().len(), 3);
    }
}
