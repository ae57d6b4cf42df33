// src/services/details.rs

//! Detail page fetching.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Config, HttpMethod, ListingCandidate, StructuredRecord};
use crate::services::extractor::MarkupExtractor;
use crate::utils::http::{HttpRequest, Transport};

/// Fetches one candidate's detail page and extracts a record from it.
pub struct DetailFetcher {
    transport: Arc<dyn Transport>,
    method: HttpMethod,
    extractor: MarkupExtractor,
}

impl DetailFetcher {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            transport,
            method: config.detail.method,
            extractor: MarkupExtractor::new(&config.selectors)?,
        })
    }

    /// Only a transport failure is an error; field misses leave fields empty.
    pub async fn fetch_detail(&self, candidate: &ListingCandidate) -> Result<StructuredRecord> {
        let request = HttpRequest::new(self.method, &candidate.link);
        let response = self.transport.request(&request).await?;
        log::debug!(
            "Fetched {} ({} bytes)",
            candidate.link,
            response.body.len()
        );
        Ok(self
            .extractor
            .parse_record(&response.body, &candidate.link, &candidate.normalized_title))
    }
}
