// src/models/selectors.rs

//! CSS selectors for scraping a job detail page.

use serde::{Deserialize, Serialize};

/// Primary selectors for each detail-page field.
///
/// Each field falls back to its own heuristic when the selector matches nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSelectors {
    /// Selector for the page heading
    #[serde(default = "default_title")]
    pub title: String,

    /// Selector for the posted date
    #[serde(default = "default_date")]
    pub date: String,

    /// Selector for the article body
    #[serde(default = "default_description")]
    pub description: String,

    /// Selector for the apply button (its `href` becomes the apply URL)
    #[serde(default = "default_apply_link")]
    pub apply_link: String,

    /// Selector for the category label
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_title() -> String {
    "h1.entry-title".to_string()
}

fn default_date() -> String {
    "span.meta-date".to_string()
}

fn default_description() -> String {
    "div.entry-content".to_string()
}

fn default_apply_link() -> String {
    "a.apply-button".to_string()
}

fn default_category() -> String {
    "span.category".to_string()
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            title: default_title(),
            date: default_date(),
            description: default_description(),
            apply_link: default_apply_link(),
            category: default_category(),
        }
    }
}

impl FieldSelectors {
    /// Field name and selector pairs, in extraction order.
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("title", &self.title),
            ("date", &self.date),
            ("description", &self.description),
            ("apply_link", &self.apply_link),
            ("category", &self.category),
        ]
    }
}
