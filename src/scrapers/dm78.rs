//! 78dm.net search-page scraper implementation

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{FetchError, ParseError};
use crate::models::{
    ExtractedPage, ProductRecord, UNKNOWN_MANUFACTURER, UNKNOWN_NAME, UNKNOWN_PRICE,
    UNKNOWN_RELEASE, UNKNOWN_TYPE,
};
use crate::traits::{BROWSER_USER_AGENT, ScraperConfig, SiteSelectors, WebsiteScraper};

/// Scraper implementation for the 78dm search endpoint
pub struct Dm78Scraper {
    client: Client,
    config: ScraperConfig,
    selectors: Arc<CardSelectors>,
}

/// Compiled form of [`SiteSelectors`]
#[derive(Debug)]
pub struct CardSelectors {
    card: Selector,
    type_tag: Selector,
    title: Selector,
    manufacturer: Selector,
    release_date: Selector,
    price: Selector,
    image: Selector,
}

impl CardSelectors {
    pub fn compile(selectors: &SiteSelectors) -> Result<Self, ParseError> {
        Ok(Self {
            card: parse_selector("card", &selectors.product_card)?,
            type_tag: parse_selector("type", &selectors.type_tag)?,
            title: parse_selector("title", &selectors.title)?,
            manufacturer: parse_selector("manufacturer", &selectors.manufacturer)?,
            release_date: parse_selector("release date", &selectors.release_date)?,
            price: parse_selector("price", &selectors.price)?,
            image: parse_selector("image", &selectors.image)?,
        })
    }
}

fn parse_selector(name: &'static str, selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::Selector {
        name,
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Selectors matching the site's search-result markup
pub fn default_selectors() -> SiteSelectors {
    SiteSelectors {
        product_card: ".card.is-shadowless".to_string(),
        type_tag: ".tag-title".to_string(),
        title: ".card-title".to_string(),
        manufacturer: "td.brand".to_string(),
        release_date: "td.sale-time".to_string(),
        // The site really emits class="price>"
        price: r"td.price\>, td.price".to_string(),
        image: "img.single-cover".to_string(),
    }
}

impl Dm78Scraper {
    /// Create a new scraper for the configured origin and result type
    pub fn new(app: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .danger_accept_invalid_certs(true)
            .timeout(app.timeout)
            .build()?;

        let config = ScraperConfig {
            name: "78动漫".to_string(),
            base_url: app.base_url.clone(),
            search_url_pattern: format!(
                "{}/search?page={{page}}&type={{type}}&keyword={{query}}",
                app.base_url
            ),
            result_type: app.result_type,
            selectors: default_selectors(),
        };
        let selectors = Arc::new(CardSelectors::compile(&config.selectors)?);

        Ok(Self {
            client,
            config,
            selectors,
        })
    }
}

#[async_trait]
impl WebsiteScraper for Dm78Scraper {
    fn config(&self) -> &ScraperConfig {
        &self.config
    }

    async fn fetch_page(&self, keyword: &str, page: u32) -> Result<String, FetchError> {
        let url = self.build_search_url(keyword, page);
        info!("Fetching page {} from {}: {}", page, self.config.name, url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(source) => return Err(FetchError::Transport { url, source }),
        };

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        match response.text().await {
            Ok(html) => Ok(html),
            Err(source) => Err(FetchError::Transport { url, source }),
        }
    }

    async fn extract_page(&self, html: String) -> Result<ExtractedPage, ParseError> {
        let selectors = Arc::clone(&self.selectors);
        let base_url = self.config.base_url.clone();

        // Html is !Send, so the whole parse stays on the blocking thread
        let page =
            tokio::task::spawn_blocking(move || extract_products(&html, &selectors, &base_url))
                .await?;
        Ok(page)
    }
}

/// Extract every product card from a search-result document
pub fn extract_products(html: &str, selectors: &CardSelectors, base_url: &str) -> ExtractedPage {
    let document = Html::parse_document(html);
    let mut page = ExtractedPage::default();

    for card in document.select(&selectors.card) {
        page.card_count += 1;
        match extract_card(card, selectors, base_url) {
            Ok(product) => page.products.push(product),
            Err(e) => warn!("Skipping product card {}: {}", page.card_count, e),
        }
    }

    debug!(
        "Extracted {} products from {} cards",
        page.products.len(),
        page.card_count
    );
    page
}

fn extract_card(
    card: ElementRef<'_>,
    selectors: &CardSelectors,
    base_url: &str,
) -> Result<ProductRecord, ParseError> {
    let has_elements = card.children().any(|child| child.value().is_element());
    if !has_elements && card.text().all(|t| t.trim().is_empty()) {
        return Err(ParseError::EmptyCard);
    }

    let product_type = text_of(card, &selectors.type_tag).unwrap_or_else(|| UNKNOWN_TYPE.to_string());
    let title = text_of(card, &selectors.title).unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let name = strip_type(&title, &product_type);

    let manufacturer =
        text_of(card, &selectors.manufacturer).unwrap_or_else(|| UNKNOWN_MANUFACTURER.to_string());
    let release_date =
        text_of(card, &selectors.release_date).unwrap_or_else(|| UNKNOWN_RELEASE.to_string());
    let price = text_of(card, &selectors.price).unwrap_or_else(|| UNKNOWN_PRICE.to_string());

    let image_url = card
        .select(&selectors.image)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| normalize_url(src, base_url))
        .unwrap_or_default();

    // Cards are wrapped in the anchor pointing at the detail page
    let product_url = card
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|parent| parent.value().name() == "a")
        .and_then(|link| link.value().attr("href"))
        .map(|href| normalize_url(href, base_url))
        .unwrap_or_default();

    Ok(ProductRecord {
        product_type,
        name,
        manufacturer,
        release_date,
        price,
        image_url,
        product_url,
    })
}

fn text_of(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Remove the category tag from a title that embeds it
fn strip_type(title: &str, product_type: &str) -> String {
    if !product_type.is_empty() && title.contains(product_type) {
        title.replace(product_type, "").trim().to_string()
    } else {
        title.to_string()
    }
}

/// Turn protocol-relative and root-relative URLs into absolute ones
pub fn normalize_url(src: &str, base_url: &str) -> String {
    if src.starts_with("//") {
        format!("https:{src}")
    } else if src.starts_with('/') {
        format!("{base_url}{src}")
    } else {
        src.to_string()
    }
}
