use tracing::{error, info, warn};

use crate::error::{FetchError, ParseError};
use crate::models::ProductRecord;
use crate::traits::WebsiteScraper;

/// Records gathered for one keyword across all attempted pages
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub keyword: String,
    /// Records in page order, then card order
    pub records: Vec<ProductRecord>,
    pub pages_fetched: u32,
    /// Pages that could not be downloaded, with the reason
    pub failures: Vec<(u32, FetchError)>,
    /// Pages that were downloaded but could not be extracted
    pub extract_failures: Vec<(u32, ParseError)>,
}

impl SearchOutcome {
    /// Nothing was found and at least one page failed to download or extract
    pub fn is_failure(&self) -> bool {
        self.records.is_empty() && !(self.failures.is_empty() && self.extract_failures.is_empty())
    }
}

/// Walk pages `1..=max_pages` for `keyword`, stopping at the first empty page.
///
/// A page answered with an error status is skipped; a transport failure ends
/// the walk since later pages would hit the same condition. Records from
/// pages already processed are always kept.
pub async fn search_products(
    scraper: &dyn WebsiteScraper,
    keyword: &str,
    max_pages: u32,
) -> SearchOutcome {
    let site = &scraper.config().name;
    info!("Searching {} for '{}' ({} pages max)", site, keyword, max_pages);

    let mut outcome = SearchOutcome {
        keyword: keyword.to_string(),
        ..SearchOutcome::default()
    };

    for page in 1..=max_pages {
        let html = match scraper.fetch_page(keyword, page).await {
            Ok(html) => html,
            Err(e) if e.is_transport() => {
                error!("Page {} for '{}' failed, stopping: {}", page, keyword, e);
                outcome.failures.push((page, e));
                break;
            }
            Err(e) => {
                warn!("Page {} for '{}' skipped: {}", page, keyword, e);
                outcome.failures.push((page, e));
                continue;
            }
        };
        outcome.pages_fetched += 1;

        let extracted = match scraper.extract_page(html).await {
            Ok(extracted) => extracted,
            Err(e) => {
                error!("Could not extract page {} for '{}': {}", page, keyword, e);
                outcome.extract_failures.push((page, e));
                break;
            }
        };

        if extracted.is_exhausted() {
            info!("No product cards on page {} for '{}', stopping", page, keyword);
            break;
        }

        outcome.records.extend(extracted.products);
    }

    info!(
        "Found {} products for '{}' across {} pages",
        outcome.records.len(),
        keyword,
        outcome.pages_fetched
    );
    outcome
}
