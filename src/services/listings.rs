// src/services/listings.rs

//! Listing feed pagination.

use std::sync::Arc;

use scraper::{Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{Config, HttpMethod, ListingCandidate, ListingConfig};
use crate::services::dedup::DedupIndex;
use crate::services::extractor::parse_selector;
use crate::services::filter::KeywordFilter;
use crate::utils::http::{HttpRequest, Transport};
use crate::utils::{clean_text, resolve_url};

/// Requests listing pages and turns their entries into filtered, deduplicated candidates.
pub struct ListingPaginator {
    transport: Arc<dyn Transport>,
    listing: ListingConfig,
    entry: Selector,
    filter: KeywordFilter,
    base_url: Url,
}

impl ListingPaginator {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            transport,
            listing: config.listing.clone(),
            entry: parse_selector(&config.listing.entry_selector)?,
            filter: KeywordFilter::from_config(config),
            base_url: Url::parse(&config.base_url)?,
        })
    }

    /// Build the request for one page.
    pub fn page_request(&self, page: u32) -> HttpRequest {
        let mut request = HttpRequest::new(self.listing.method, &self.listing.endpoint);
        let page = page.to_string();
        match self.listing.method {
            HttpMethod::Post => {
                for (name, value) in &self.listing.form {
                    request = request.form_field(name, value);
                }
                request = request.form_field(&self.listing.page_param, page);
            }
            HttpMethod::Get => {
                for (name, value) in &self.listing.form {
                    request = request.param(name, value);
                }
                request = request.param(&self.listing.page_param, page);
            }
        }
        request
    }

    /// Fetch one page; a transport failure yields an empty page.
    pub async fn fetch_page(&self, page: u32, index: &mut DedupIndex) -> Vec<ListingCandidate> {
        match self.try_fetch_page(page, index).await {
            Ok(candidates) => candidates,
            Err(e) => {
                log::error!("Failed to get notification listings from page {page}: {e}");
                Vec::new()
            }
        }
    }

    /// Fetch one page, surfacing transport failures.
    pub async fn try_fetch_page(
        &self,
        page: u32,
        index: &mut DedupIndex,
    ) -> Result<Vec<ListingCandidate>> {
        log::info!("Fetching notification listings from page {page}");
        let response = self.transport.request(&self.page_request(page)).await?;
        let candidates = self.parse_page(&response.body, index);
        log::info!(
            "Found {} new job listings on page {page}",
            candidates.len()
        );
        Ok(candidates)
    }

    /// Scan a listing page body in document order.
    ///
    /// Each accepted entry is registered in `index` before the next entry is
    /// examined, so repeats within the page and across pages are dropped.
    pub fn parse_page(&self, body: &str, index: &mut DedupIndex) -> Vec<ListingCandidate> {
        let document = Html::parse_document(body);
        let mut candidates = Vec::new();

        for anchor in document.select(&self.entry) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let title = clean_text(&anchor.text().collect::<String>());
            if title.is_empty() {
                continue;
            }
            let link = resolve_url(&self.base_url, href.trim());

            if index.is_duplicate(&title, &link) {
                log::debug!("Skipping duplicate job: {title}");
                continue;
            }
            if !self.filter.should_include(&title) {
                log::debug!("Filtered out: {title}");
                continue;
            }

            index.register(&title, &link);
            candidates.push(ListingCandidate {
                normalized_title: KeywordFilter::clean_title(&title),
                title,
                link,
            });
        }

        candidates
    }
}
