//! Ordered free-text pattern tables for detail-page fields.
//!
//! Every entry is a `(field, pattern, post-process)` triple. For a given
//! field the entries are tried in insertion order and the first pattern that
//! matches decides the value; later patterns for that field are not tried.
//! New fields or patterns are added by pushing entries, not by editing code.

use std::collections::HashMap;

use regex::Regex;

use crate::error::Result;
use crate::models::Vacancies;
use crate::utils::{clean_text, is_absolute_http_url};

/// Logical field filled from description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailField {
    Organization,
    Location,
    Salary,
    Vacancies,
    Qualification,
    Experience,
    JobType,
    LastDate,
}

/// Conversion applied to the first capture group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    /// Collapse whitespace
    Clean,
    /// Parse as integer, keeping the raw token on failure
    Count,
}

/// Value produced by a pattern match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Vacancies(Vacancies),
}

impl FieldValue {
    pub fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Vacancies(v) => Some(v.to_string()),
        }
    }

    pub fn into_vacancies(self) -> Option<Vacancies> {
        match self {
            FieldValue::Vacancies(v) => Some(v),
            FieldValue::Text(s) => Some(Vacancies::parse(&s)),
        }
    }
}

/// One row of the table.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub field: DetailField,
    pub pattern: Regex,
    pub post: PostProcess,
}

impl FieldPattern {
    pub fn new(field: DetailField, pattern: &str, post: PostProcess) -> Result<Self> {
        Ok(Self {
            field,
            pattern: Regex::new(pattern)?,
            post,
        })
    }

    /// `None` when the pattern does not match.
    ///
    /// A match whose capture cleans to nothing yields `Some(None)`. It still
    /// claims the field.
    fn apply(&self, text: &str) -> Option<Option<FieldValue>> {
        let caps = self.pattern.captures(text)?;
        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let cleaned = clean_text(raw);
        if cleaned.is_empty() {
            return Some(None);
        }
        Some(Some(match self.post {
            PostProcess::Clean => FieldValue::Text(cleaned),
            PostProcess::Count => FieldValue::Vacancies(Vacancies::parse(&cleaned)),
        }))
    }
}

/// Ordered table of field patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: Vec<FieldPattern>,
}

/// Built-in patterns, in priority order per field.
const BUILTIN_PATTERNS: &[(DetailField, &str, PostProcess)] = &[
    (DetailField::Organization, r"Organization(?:\s+Name)?[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Organization, r"Department[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Organization, r"Company[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Location, r"Location[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Location, r"Place[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Location, r"Job Location[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Salary, r"Salary[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Salary, r"Pay Scale[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Salary, r"Stipend[:\s]+([^\n]+)", PostProcess::Clean),
    // Numeric counts first; a word is only taken after an explicit colon.
    (DetailField::Vacancies, r"Vacancies[:\s]+([0-9]+)\b", PostProcess::Count),
    (DetailField::Vacancies, r"Total Posts[:\s]+([0-9]+)\b", PostProcess::Count),
    (DetailField::Vacancies, r"No\. of Posts[:\s]+([0-9]+)\b", PostProcess::Count),
    (DetailField::Vacancies, r"Vacancies\s*:\s*([A-Za-z0-9]+)", PostProcess::Count),
    (DetailField::Vacancies, r"Total Posts\s*:\s*([A-Za-z0-9]+)", PostProcess::Count),
    (DetailField::Vacancies, r"No\. of Posts\s*:\s*([A-Za-z0-9]+)", PostProcess::Count),
    (DetailField::Qualification, r"Qualification[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Qualification, r"Educational Qualification[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Qualification, r"Education[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Experience, r"Experience[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Experience, r"Work Experience[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::Experience, r"Required Experience[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::JobType, r"Job Type[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::JobType, r"Employment Type[:\s]+([^\n]+)", PostProcess::Clean),
    (DetailField::JobType, r"Type of Job[:\s]+([^\n]+)", PostProcess::Clean),
    (
        DetailField::LastDate,
        r"Last Date(?:\s+to Apply)?[:\s]+([0-9]{1,2}(?:st|nd|rd|th)?\s+[A-Za-z]+,?\s+[0-9]{4})",
        PostProcess::Clean,
    ),
    (DetailField::LastDate, r"Last Date[:\s]+([0-9]{1,2}-[0-9]{1,2}-[0-9]{4})", PostProcess::Clean),
    (
        DetailField::LastDate,
        r"Apply Before[:\s]+([0-9]{1,2}(?:st|nd|rd|th)?\s+[A-Za-z]+,?\s+[0-9]{4})",
        PostProcess::Clean,
    ),
];

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table.
    pub fn builtin() -> Result<Self> {
        let mut table = Self::new();
        for (field, pattern, post) in BUILTIN_PATTERNS {
            table.push(FieldPattern::new(*field, pattern, *post)?);
        }
        Ok(table)
    }

    /// Append a pattern at the lowest priority for its field.
    pub fn push(&mut self, pattern: FieldPattern) {
        self.patterns.push(pattern);
    }

    /// First-match reducer for one field.
    pub fn first_match(&self, field: DetailField, text: &str) -> Option<FieldValue> {
        self.patterns
            .iter()
            .filter(|p| p.field == field)
            .find_map(|p| p.apply(text))
            .flatten()
    }

    /// Run the reducer for every field present in the table.
    pub fn extract_all(&self, text: &str) -> HashMap<DetailField, FieldValue> {
        let mut fields: Vec<DetailField> = Vec::new();
        for p in &self.patterns {
            if !fields.contains(&p.field) {
                fields.push(p.field);
            }
        }
        fields
            .into_iter()
            .filter_map(|field| self.first_match(field, text).map(|v| (field, v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Labelled "`<Label>: <url>`" link patterns scanned in description text.
#[derive(Debug, Clone)]
pub struct LinkPatterns {
    patterns: Vec<(String, Regex)>,
}

const BUILTIN_LINK_LABELS: &[&str] = &["Official Website", "Notification", "Apply Online"];

impl LinkPatterns {
    pub fn builtin() -> Result<Self> {
        let patterns = BUILTIN_LINK_LABELS
            .iter()
            .map(|label| {
                let pattern = format!(r"{}[:\s]+([^\n]+)", regex::escape(label));
                Ok((label.to_string(), Regex::new(&pattern)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// `(label, url)` for every label whose first capture is an absolute URL, in label order.
    pub fn scan(&self, text: &str) -> Vec<(String, String)> {
        self.patterns
            .iter()
            .filter_map(|(label, regex)| {
                let caps = regex.captures(text)?;
                let value = clean_text(caps.get(1)?.as_str());
                is_absolute_http_url(&value).then(|| (label.clone(), value))
            })
            .collect()
    }
}
