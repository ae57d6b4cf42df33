// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod listing;
mod record;
mod selectors;

// Re-export all public types
pub use config::{
    Config, DetailConfig, HttpMethod, ListingConfig, LoggingConfig, RateLimitConfig,
    ScheduleConfig, ScraperConfig, StorageConfig, StorageFormat,
};
pub use listing::ListingCandidate;
pub use record::{
    ApplicationMethod, ImportantDate, ImportantLink, PriorEntry, StructuredRecord, Vacancies,
};
pub use selectors::FieldSelectors;
