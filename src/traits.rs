//! Traits and interfaces for site-agnostic product search

use async_trait::async_trait;

use crate::error::{FetchError, ParseError};
use crate::models::ExtractedPage;

/// Desktop browser user agent sent with every search request
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for a search-page scraper
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Display name for the website
    pub name: String,
    /// Site origin used to absolutize relative URLs
    pub base_url: String,
    /// Search URL pattern with `{page}`, `{type}` and `{query}` placeholders
    pub search_url_pattern: String,
    /// Content category requested from the search endpoint
    pub result_type: u32,
    /// CSS selectors for extracting data
    pub selectors: SiteSelectors,
}

/// CSS selectors for the parts of a product card
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Container selector for individual products
    pub product_card: String,
    /// Category tag within the card
    pub type_tag: String,
    /// Title block within the card
    pub title: String,
    pub manufacturer: String,
    pub release_date: String,
    pub price: String,
    /// Cover image within the card
    pub image: String,
}

/// Trait for site-specific search scrapers
#[async_trait]
pub trait WebsiteScraper: Send + Sync {
    /// Get the configuration for this scraper
    fn config(&self) -> &ScraperConfig;

    /// Download one page of search results
    ///
    /// # Arguments
    /// * `keyword` - The raw, unencoded search term
    /// * `page` - 1-based page number
    ///
    /// # Returns
    /// * `Result<String, FetchError>` - The page HTML or the fetch failure
    async fn fetch_page(&self, keyword: &str, page: u32) -> Result<String, FetchError>;

    /// Turn one page of HTML into product records
    ///
    /// Cards that fail to parse are dropped; only failures affecting the
    /// whole page are returned as errors.
    async fn extract_page(&self, html: String) -> Result<ExtractedPage, ParseError>;

    /// Build the search URL for a keyword and page
    fn build_search_url(&self, keyword: &str, page: u32) -> String {
        let encoded = urlencoding::encode(keyword);
        self.config()
            .search_url_pattern
            .replace("{page}", &page.to_string())
            .replace("{type}", &self.config().result_type.to_string())
            .replace("{query}", &encoded)
    }
}
