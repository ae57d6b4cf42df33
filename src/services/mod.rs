//! Service layer for the crawler application.
//!
//! This module contains the scraping logic for:
//! - Keyword filtering and title cleanup (`KeywordFilter`)
//! - Duplicate suppression (`DedupIndex`)
//! - Listing pagination (`ListingPaginator`)
//! - Detail page fetching (`DetailFetcher`)
//! - Field extraction (`MarkupExtractor`, `PatternTable`)

pub mod dedup;
pub mod details;
pub mod extractor;
pub mod filter;
pub mod listings;
pub mod patterns;

pub use dedup::DedupIndex;
pub use details::DetailFetcher;
pub use extractor::{Field, MarkupExtractor};
pub use filter::KeywordFilter;
pub use listings::ListingPaginator;
pub use patterns::{DetailField, FieldPattern, FieldValue, PatternTable, PostProcess};
