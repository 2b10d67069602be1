//! CSS locators for reading archive pages.
//!
//! The archive has no API; everything comes from its HTML. The selectors
//! are configurable so a markup change needs a config edit, not a release.

use anyhow::anyhow;
use scraper::{ElementRef, Html, Selector};

use crate::config::LocatorConfig;

/// Compiled page locators.
#[derive(Debug, Clone)]
pub struct Locators {
    collection_name: Selector,
    listing_ids: Selector,
    lecture_title: Selector,
}

fn compile(name: &str, selector: &str) -> anyhow::Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid {} locator '{}': {:?}", name, selector, e))
}

/// Text directly inside `element`, or all descendant text when it has none.
fn element_text(element: ElementRef<'_>) -> String {
    let own: String = element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect();

    let own = own.trim();
    if !own.is_empty() {
        return own.to_string();
    }

    element.text().collect::<String>().trim().to_string()
}

impl Locators {
    pub fn from_config(config: &LocatorConfig) -> anyhow::Result<Self> {
        Ok(Self {
            collection_name: compile("collection_name", &config.collection_name)?,
            listing_ids: compile("listing_ids", &config.listing_ids)?,
            lecture_title: compile("lecture_title", &config.lecture_title)?,
        })
    }

    /// Display name of a collection from its landing page.
    pub fn collection_name(&self, html: &str) -> Option<String> {
        first_text(html, &self.collection_name)
    }

    /// Raw video IDs listed on one listing page, in page order.
    /// An absent listing container yields an empty list.
    pub fn listing_ids(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.listing_ids)
            .map(element_text)
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Lecture title from a video detail page.
    pub fn lecture_title(&self, html: &str) -> Option<String> {
        first_text(html, &self.lecture_title)
    }
}

impl Default for Locators {
    fn default() -> Self {
        Self::from_config(&LocatorConfig::default()).expect("default locators are valid")
    }
}

fn first_text(html: &str, selector: &Selector) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <div class="search_results">
            <div><b>20200101</b> <b>ignored</b><span>Talk one</span></div>
            <div><b>99999999</b></div>
        </div>
        <div class="search_results">
            <div><b> 20200102 </b></div>
        </div>
        <div class="search_results other">
            <div><b>11111111</b></div>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_listing_ids_take_first_bold_of_first_block() {
        let ids = Locators::default().listing_ids(LISTING);
        assert_eq!(ids, vec!["20200101", "20200102"]);
    }

    #[test]
    fn test_listing_ids_empty_when_container_absent() {
        let locators = Locators::default();
        assert!(locators.listing_ids("<html><body><p>No results</p></body></html>").is_empty());
        assert!(locators
            .listing_ids(r#"<div class="search_results"></div>"#)
            .is_empty());
    }

    #[test]
    fn test_collection_name_uses_first_heading() {
        let html = "<h3>PIRSA:C00042 - My Series</h3><h3>Other</h3>";
        assert_eq!(
            Locators::default().collection_name(html).as_deref(),
            Some("PIRSA:C00042 - My Series")
        );
        assert_eq!(Locators::default().collection_name("<h2>x</h2>"), None);
    }

    #[test]
    fn test_lecture_title_prefers_own_text() {
        let html = r#"<div class="lecture_title">
                A: Talk? Title
                <span class="speaker">Someone</span>
            </div>"#;
        assert_eq!(
            Locators::default().lecture_title(html).as_deref(),
            Some("A: Talk? Title")
        );

        let nested = r#"<div class="lecture_title"><span>Nested Title</span></div>"#;
        assert_eq!(
            Locators::default().lecture_title(nested).as_deref(),
            Some("Nested Title")
        );
        assert_eq!(Locators::default().lecture_title("<div></div>"), None);
    }

    #[test]
    fn test_invalid_locator_is_reported() {
        let config = LocatorConfig {
            lecture_title: "div[".to_string(),
            ..Default::default()
        };
        let err = Locators::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("lecture_title"));
    }
}
