//! Listing entry accepted from the paginated feed.

use serde::{Deserialize, Serialize};

/// A listing that passed deduplication and keyword filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCandidate {
    /// Title exactly as it appeared in the feed
    pub title: String,

    /// Display title after noise stripping
    pub normalized_title: String,

    /// Absolute URL of the detail page
    pub link: String,
}
