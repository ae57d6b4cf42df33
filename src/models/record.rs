//! Structured job record produced from a detail page.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How applications are submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationMethod {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl fmt::Display for ApplicationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationMethod::Online => f.write_str("online"),
            ApplicationMethod::Offline => f.write_str("offline"),
            ApplicationMethod::Unknown => f.write_str("unknown"),
        }
    }
}

/// Number of posts; kept as raw text when it is not an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Vacancies {
    Count(u64),
    Text(String),
}

impl Vacancies {
    /// Parse a captured token, keeping the raw text when it is not a number.
    pub fn parse(raw: &str) -> Self {
        raw.parse()
            .map(Vacancies::Count)
            .unwrap_or_else(|_| Vacancies::Text(raw.to_string()))
    }
}

impl fmt::Display for Vacancies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vacancies::Count(n) => write!(f, "{n}"),
            Vacancies::Text(s) => f.write_str(s),
        }
    }
}

/// A dated event from the notification's schedule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportantDate {
    pub event: String,
    pub date: String,
}

/// A labelled link found on the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportantLink {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

/// The final output unit of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    /// Detail page URL (unique within one run)
    pub url: String,
    pub title: String,
    pub posted_date: Option<String>,
    pub last_date: Option<String>,
    pub description: String,
    pub apply_url: Option<String>,
    pub application_method: ApplicationMethod,
    pub category: String,
    pub organization: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub vacancies: Option<Vacancies>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub job_type: Option<String>,
    /// Rows of the first table on the page, in document order
    #[serde(default)]
    pub important_dates: Vec<ImportantDate>,
    /// Description-text links first, then page hyperlinks, in document order
    #[serde(default)]
    pub important_links: Vec<ImportantLink>,
}

/// Title and link of a previously persisted record, used to seed deduplication.
///
/// Older outputs carry the detail page under `link`; record outputs carry it under `url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl PriorEntry {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            link: Some(link.into()),
            url: None,
        }
    }

    /// Every non-empty fingerprint source this entry carries.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        [&self.title, &self.link, &self.url]
            .into_iter()
            .flatten()
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

impl From<&StructuredRecord> for PriorEntry {
    fn from(record: &StructuredRecord) -> Self {
        Self::new(record.title.clone(), record.url.clone())
    }
}
