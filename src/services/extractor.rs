// src/services/extractor.rs

//! Detail-page field extraction.
//!
//! Each field has a configured CSS selector and a field-specific fallback
//! for when the selector matches nothing. Free-text fields (organization,
//! salary, ...) come from the ordered [`PatternTable`] run over the
//! description text. Extraction never fails a record: a miss leaves the
//! field empty.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    ApplicationMethod, FieldSelectors, ImportantDate, ImportantLink, StructuredRecord,
};
use crate::services::patterns::{DetailField, FieldValue, LinkPatterns, PatternTable};
use crate::utils::{clean_text, is_absolute_http_url, resolve_url};

/// Stored description when the description selector misses.
pub const NO_DESCRIPTION: &str = "No description available";

/// Category assigned when no keyword matches.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Category name and title keywords, checked in order.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("government", &["government", "sarkari", "govt"]),
    ("education", &["education", "school", "university", "college"]),
    ("medical", &["medical", "hospital", "healthcare", "doctor", "nurse"]),
    ("engineering", &["engineering", "engineer", "technical"]),
    ("banking", &["bank", "banking", "finance"]),
];

/// Labels searched in two-cell table rows when the apply button is missing.
const APPLY_ROW_LABELS: [&str; 2] = ["Apply Online", "Official Portal"];

/// Elements whose boundaries end a line of pattern source text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "h1", "h2", "h3", "h4",
    "h5", "h6", "hr", "li", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Minimum visible-text length (exclusive) for a hyperlink to be kept.
const MIN_LINK_TEXT: usize = 3;

static HEADINGS: LazyLock<Selector> = LazyLock::new(|| static_selector("h1, h2"));
static PUBLISHED_TIME: LazyLock<Selector> =
    LazyLock::new(|| static_selector("time.entry-date.published"));
static TABLE: LazyLock<Selector> = LazyLock::new(|| static_selector("table"));
static ROW: LazyLock<Selector> = LazyLock::new(|| static_selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| static_selector("td"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| static_selector("a[href]"));
static ABSOLUTE_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| static_selector(r#"a[href^="http"]"#));

fn static_selector(s: &str) -> Selector {
    Selector::parse(s).expect("built-in selector is valid")
}

/// Selector-driven field of a detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    PostedDate,
    Description,
    ApplyLink,
    Category,
}

/// Compiled selectors plus the free-text pattern tables.
#[derive(Debug, Clone)]
pub struct MarkupExtractor {
    title: Selector,
    date: Selector,
    description: Selector,
    apply_link: Selector,
    category: Selector,
    patterns: PatternTable,
    link_patterns: LinkPatterns,
}

impl MarkupExtractor {
    /// Compile the configured selectors. An invalid selector is a configuration defect.
    pub fn new(selectors: &FieldSelectors) -> Result<Self> {
        Ok(Self {
            title: parse_selector(&selectors.title)?,
            date: parse_selector(&selectors.date)?,
            description: parse_selector(&selectors.description)?,
            apply_link: parse_selector(&selectors.apply_link)?,
            category: parse_selector(&selectors.category)?,
            patterns: PatternTable::builtin()?,
            link_patterns: LinkPatterns::builtin()?,
        })
    }

    /// Replace the free-text pattern table.
    pub fn with_patterns(mut self, patterns: PatternTable) -> Self {
        self.patterns = patterns;
        self
    }

    /// Extract one field, applying its fallback on a selector miss.
    pub fn extract_field(&self, document: &Html, field: Field) -> Option<String> {
        match field {
            Field::Title => self.title(document),
            Field::PostedDate => self.posted_date(document),
            Field::Description => Some(self.description(document)),
            Field::ApplyLink => self.apply_link(document, None).0,
            Field::Category => {
                let title = self.title(document).unwrap_or_default();
                Some(self.category(document, &title))
            }
        }
    }

    /// Parse `body` and assemble a record for the page at `url`.
    pub fn parse_record(&self, body: &str, url: &str, listing_title: &str) -> StructuredRecord {
        let document = Html::parse_document(body);
        self.extract_record(&document, url, listing_title)
    }

    /// Assemble a record field by field.
    ///
    /// `listing_title` is the last title fallback after the selector and headings.
    pub fn extract_record(
        &self,
        document: &Html,
        url: &str,
        listing_title: &str,
    ) -> StructuredRecord {
        let page_url = Url::parse(url).ok();

        let title = self.title(document).unwrap_or_else(|| {
            log::debug!("No heading found on {url}, using listing title");
            listing_title.to_string()
        });

        let description_elem = document.select(&self.description).next();
        let (description, pattern_source) = match description_elem {
            Some(elem) => (element_text(&elem), pattern_source(&elem)),
            None => {
                log::warn!("Could not find job description on {url}");
                (NO_DESCRIPTION.to_string(), NO_DESCRIPTION.to_string())
            }
        };

        let (apply_url, has_button) = self.apply_link(document, page_url.as_ref());
        let application_method = if has_button {
            ApplicationMethod::Online
        } else {
            application_method(&description)
        };

        let mut fields = self.patterns.extract_all(&pattern_source);
        let mut text =
            |field: DetailField| fields.remove(&field).and_then(FieldValue::into_text);

        let organization = text(DetailField::Organization);
        let location = text(DetailField::Location);
        let salary = text(DetailField::Salary);
        let qualification = text(DetailField::Qualification);
        let experience = text(DetailField::Experience);
        let job_type = text(DetailField::JobType);
        let last_date = text(DetailField::LastDate);
        let vacancies = fields
            .remove(&DetailField::Vacancies)
            .and_then(FieldValue::into_vacancies);

        let mut important_links: Vec<ImportantLink> = self
            .link_patterns
            .scan(&pattern_source)
            .into_iter()
            .map(|(kind, url)| ImportantLink { kind, url })
            .collect();
        important_links.extend(hyperlinks(document));

        StructuredRecord {
            url: url.to_string(),
            category: self.category(document, &title),
            title,
            posted_date: self.posted_date(document),
            last_date,
            description,
            apply_url,
            application_method,
            organization,
            location,
            salary,
            vacancies,
            qualification,
            experience,
            job_type,
            important_dates: important_dates(document),
            important_links,
        }
    }

    fn title(&self, document: &Html) -> Option<String> {
        first_text(document, &self.title).or_else(|| {
            document
                .select(&HEADINGS)
                .map(|h| element_text(&h))
                .find(|t| !t.is_empty())
        })
    }

    fn posted_date(&self, document: &Html) -> Option<String> {
        first_text(document, &self.date).or_else(|| first_text(document, &PUBLISHED_TIME))
    }

    fn description(&self, document: &Html) -> String {
        first_text(document, &self.description).unwrap_or_else(|| NO_DESCRIPTION.to_string())
    }

    /// Apply URL and whether the page has an apply button.
    ///
    /// A button without an `href` still counts as a button; the URL then
    /// comes from the labelled table rows.
    fn apply_link(&self, document: &Html, base: Option<&Url>) -> (Option<String>, bool) {
        let resolve = |href: &str| match base {
            Some(base) => resolve_url(base, href),
            None => href.to_string(),
        };

        let button = document.select(&self.apply_link).next();
        let button_href = button
            .and_then(|b| b.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(resolve);

        let apply_url = button_href.or_else(|| {
            APPLY_ROW_LABELS
                .iter()
                .find_map(|label| labelled_row_href(document, label).map(|href| resolve(&href)))
        });
        (apply_url, button.is_some())
    }

    fn category(&self, document: &Html, title: &str) -> String {
        first_text(document, &self.category).unwrap_or_else(|| categorize(title))
    }
}

/// Compile a configured selector.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Keyword-match a title against the category table.
pub fn categorize(title: &str) -> String {
    let title = title.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| title.contains(kw)))
        .map_or_else(|| UNCATEGORIZED.to_string(), |(name, _)| name.to_string())
}

/// Scan description text for an application method.
pub fn application_method(description: &str) -> ApplicationMethod {
    let text = description.to_lowercase();
    if text.contains("apply online") {
        ApplicationMethod::Online
    } else if text.contains("apply offline") {
        ApplicationMethod::Offline
    } else {
        ApplicationMethod::Unknown
    }
}

/// Text with a newline at every block-element boundary. Whitespace inside
/// text nodes becomes plain spaces so only block boundaries break lines.
fn block_text(elem: &ElementRef<'_>) -> String {
    let mut out = String::new();
    push_block_text(elem, &mut out);
    out
}

fn push_block_text(elem: &ElementRef<'_>, out: &mut String) {
    for child in elem.children() {
        if let Some(child_elem) = ElementRef::wrap(child) {
            let name = child_elem.value().name();
            if matches!(name, "script" | "style") {
                continue;
            }
            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                out.push('\n');
            }
            push_block_text(&child_elem, out);
            if block {
                out.push('\n');
            }
        } else if let Node::Text(text) = child.value() {
            out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
        }
    }
}

fn element_text(elem: &ElementRef<'_>) -> String {
    clean_text(&block_text(elem))
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|e| element_text(&e))
        .filter(|t| !t.is_empty())
}

/// One cleaned line per block, so line captures stop at block boundaries
/// and run across inline markup.
fn pattern_source(elem: &ElementRef<'_>) -> String {
    block_text(elem)
        .split('\n')
        .map(clean_text)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn important_dates(document: &Html) -> Vec<ImportantDate> {
    let Some(table) = document.select(&TABLE).next() else {
        return Vec::new();
    };
    table
        .select(&ROW)
        .filter_map(|row| {
            let mut cells = row.select(&CELL);
            let event = cells.next()?;
            let date = cells.next()?;
            Some(ImportantDate {
                event: element_text(&event),
                date: element_text(&date),
            })
        })
        .collect()
}

fn hyperlinks(document: &Html) -> impl Iterator<Item = ImportantLink> + '_ {
    document.select(&ABSOLUTE_ANCHOR).filter_map(|a| {
        let href = a.value().attr("href")?.trim();
        let text = element_text(&a);
        (text.chars().count() > MIN_LINK_TEXT && is_absolute_http_url(href)).then(|| {
            ImportantLink {
                kind: text,
                url: href.to_string(),
            }
        })
    })
}

/// `href` of the first link in the second cell of a two-cell row labelled `label`.
fn labelled_row_href(document: &Html, label: &str) -> Option<String> {
    let label = label.to_lowercase();
    document.select(&ROW).find_map(|row| {
        let cells: Vec<_> = row.select(&CELL).collect();
        let [head, value] = cells.as_slice() else {
            return None;
        };
        if !element_text(head).to_lowercase().contains(&label) {
            return None;
        }
        value
            .select(&ANCHOR)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vacancies;
    use crate::services::patterns::{FieldPattern, PostProcess};

    const DETAIL_PAGE: &str = r#"
        <html><body>
          <h1 class="entry-title">GPSC Assistant Engineer Recruitment 2025</h1>
          <span class="meta-date">12 January 2025</span>
          <div class="entry-content">
            <p>Organization Name: Gujarat Public Service Commission</p>
            <p>Location: Gandhinagar</p>
            <p>Total Posts: 42</p>
            <p>Salary: Rs. 44,900 - 1,42,400</p>
            <p>Qualification: B.E. Civil</p>
            <p>Last Date to Apply: 28th February, 2025</p>
            <p>Official Website: https://gpsc.gujarat.gov.in</p>
            <p>Candidates can Apply Online through OJAS.</p>
            <table>
              <tr><th>Event</th><th>Date</th></tr>
              <tr><td>Start Date</td><td>01-02-2025</td></tr>
              <tr><td>Last Date</td><td>28-02-2025</td></tr>
              <tr><td>Single cell</td></tr>
            </table>
            <a href="https://ojas.gujarat.gov.in/notice.pdf">Notification PDF</a>
            <a href="https://ojas.gujarat.gov.in">Go</a>
            <a href="/relative">Relative Link</a>
          </div>
        </body></html>
    "#;

    fn extractor() -> MarkupExtractor {
        MarkupExtractor::new(&FieldSelectors::default()).unwrap()
    }

    #[test]
    fn test_invalid_selector_is_config_defect() {
        let selectors = FieldSelectors {
            title: "[[invalid".to_string(),
            ..FieldSelectors::default()
        };
        let err = MarkupExtractor::new(&selectors).unwrap_err();
        assert!(err.is_config_defect());
    }

    #[test]
    fn test_extract_full_record() {
        let record = extractor().parse_record(DETAIL_PAGE, "https://x/gpsc-ae", "GPSC AE");

        assert_eq!(record.title, "GPSC Assistant Engineer Recruitment 2025");
        assert_eq!(record.posted_date.as_deref(), Some("12 January 2025"));
        assert_eq!(
            record.organization.as_deref(),
            Some("Gujarat Public Service Commission")
        );
        assert_eq!(record.location.as_deref(), Some("Gandhinagar"));
        assert_eq!(record.vacancies, Some(Vacancies::Count(42)));
        assert_eq!(record.salary.as_deref(), Some("Rs. 44,900 - 1,42,400"));
        assert_eq!(record.qualification.as_deref(), Some("B.E. Civil"));
        assert_eq!(record.last_date.as_deref(), Some("28th February, 2025"));
        assert_eq!(record.application_method, ApplicationMethod::Online);
        assert_eq!(record.apply_url, None);
        assert_eq!(record.category, "engineering");
        assert!(record.description.starts_with("Organization Name: Gujarat"));
        assert_eq!(record.experience, None);
    }

    #[test]
    fn test_important_dates_in_row_order() {
        let record = extractor().parse_record(DETAIL_PAGE, "https://x/1", "t");
        assert_eq!(
            record.important_dates,
            vec![
                ImportantDate {
                    event: "Start Date".into(),
                    date: "01-02-2025".into()
                },
                ImportantDate {
                    event: "Last Date".into(),
                    date: "28-02-2025".into()
                },
            ]
        );
    }

    #[test]
    fn test_important_links_text_patterns_then_hyperlinks() {
        let record = extractor().parse_record(DETAIL_PAGE, "https://x/1", "t");
        let links: Vec<(&str, &str)> = record
            .important_links
            .iter()
            .map(|l| (l.kind.as_str(), l.url.as_str()))
            .collect();
        assert_eq!(
            links,
            vec![
                ("Official Website", "https://gpsc.gujarat.gov.in"),
                ("Notification PDF", "https://ojas.gujarat.gov.in/notice.pdf"),
            ]
        );
    }

    #[test]
    fn test_fallbacks_on_selector_miss() {
        let page = r#"
            <html><body>
              <h2>  </h2>
              <h2>Talati cum Mantri Bharti</h2>
              <time class="entry-date published">3 March 2025</time>
            </body></html>
        "#;
        let ex = extractor();
        let record = ex.parse_record(page, "https://x/2", "Talati");
        assert_eq!(record.title, "Talati cum Mantri Bharti");
        assert_eq!(record.posted_date.as_deref(), Some("3 March 2025"));
        assert_eq!(record.description, NO_DESCRIPTION);
        assert_eq!(record.application_method, ApplicationMethod::Unknown);
        assert_eq!(record.category, UNCATEGORIZED);
        assert!(record.important_dates.is_empty());
        assert!(record.important_links.is_empty());

        let document = Html::parse_document(page);
        assert_eq!(
            ex.extract_field(&document, Field::Description).as_deref(),
            Some(NO_DESCRIPTION)
        );
        assert_eq!(ex.extract_field(&document, Field::ApplyLink), None);
    }

    #[test]
    fn test_listing_title_is_last_title_fallback() {
        let record = extractor().parse_record("<p>nothing</p>", "https://x/3", "Junior Clerk");
        assert_eq!(record.title, "Junior Clerk");
    }

    #[test]
    fn test_apply_button_sets_online() {
        let page = r#"
            <h1 class="entry-title">Peon Bharti</h1>
            <div class="entry-content">Apply offline by post.</div>
            <a class="apply-button" href="/apply">Apply</a>
        "#;
        let record = extractor().parse_record(page, "https://site.in/peon/", "Peon");
        assert_eq!(record.apply_url.as_deref(), Some("https://site.in/apply"));
        assert_eq!(record.application_method, ApplicationMethod::Online);
    }

    #[test]
    fn test_apply_url_table_fallback() {
        let page = r#"
            <div class="entry-content">Send the form. Apply offline.</div>
            <table>
              <tr><td>Official Portal</td><td><a href="https://portal.example.in">Click</a></td></tr>
              <tr><td>Apply Online</td><td><a href="https://apply.example.in">Click</a></td></tr>
            </table>
        "#;
        let record = extractor().parse_record(page, "https://x/4", "t");
        assert_eq!(record.apply_url.as_deref(), Some("https://apply.example.in"));
        assert_eq!(record.application_method, ApplicationMethod::Offline);
    }

    #[test]
    fn test_apply_button_without_href_sets_online() {
        let page = r#"
            <div class="entry-content">Send the form by post.</div>
            <a class="apply-button">Apply</a>
            <table>
              <tr><td>Apply Online</td><td><a href="/form">Click</a></td></tr>
            </table>
        "#;
        let record = extractor().parse_record(page, "https://site.in/jobs/", "t");
        assert_eq!(record.application_method, ApplicationMethod::Online);
        assert_eq!(record.apply_url.as_deref(), Some("https://site.in/form"));
    }

    #[test]
    fn test_inline_markup_stays_on_one_line() {
        let page = r#"
            <div class="entry-content">
              <p>Salary: Rs. <strong>25,500</strong> per month</p>
              <p>Organization: <a href="https://gssb.gujarat.gov.in">Gujarat Subordinate Service Selection Board</a></p>
              <ul><li>Qualification: <em>Graduate</em> in any stream</li><li>Experience: Not required</li></ul>
              <p>Location: Ahmedabad<br>Job Type: Permanent</p>
            </div>
        "#;
        let record = extractor().parse_record(page, "https://x/6", "t");
        assert_eq!(record.salary.as_deref(), Some("Rs. 25,500 per month"));
        assert_eq!(
            record.organization.as_deref(),
            Some("Gujarat Subordinate Service Selection Board")
        );
        assert_eq!(record.qualification.as_deref(), Some("Graduate in any stream"));
        assert_eq!(record.experience.as_deref(), Some("Not required"));
        assert_eq!(record.location.as_deref(), Some("Ahmedabad"));
        assert_eq!(record.job_type.as_deref(), Some("Permanent"));
    }

    #[test]
    fn test_description_separates_blocks() {
        let page = r#"<div class="entry-content"><p>Salary: Rs. 25,500 per month</p><p>Organization: GSSSB</p></div>"#;
        let record = extractor().parse_record(page, "https://x/7", "t");
        assert_eq!(
            record.description,
            "Salary: Rs. 25,500 per month Organization: GSSSB"
        );
    }

    #[test]
    fn test_custom_pattern_table() {
        let mut patterns = PatternTable::new();
        patterns.push(
            FieldPattern::new(DetailField::Salary, r"Pay Level[:\s]+([^\n]+)", PostProcess::Clean)
                .unwrap(),
        );
        let ex = extractor().with_patterns(patterns);
        let page = r#"<div class="entry-content"><p>Pay Level: 7</p><p>Location: Surat</p></div>"#;
        let record = ex.parse_record(page, "https://x/8", "t");
        assert_eq!(record.salary.as_deref(), Some("7"));
        assert_eq!(record.location, None);
    }

    #[test]
    fn test_category_selector_and_keyword_table() {
        let page = r#"<h1 class="entry-title">Bank Clerk</h1><span class="category">Jobs</span>"#;
        let document = Html::parse_document(page);
        assert_eq!(
            extractor().extract_field(&document, Field::Category).as_deref(),
            Some("Jobs")
        );

        assert_eq!(categorize("Sarkari Naukri 2025"), "government");
        assert_eq!(categorize("Civil Hospital Nurse"), "medical");
        assert_eq!(categorize("Govt Engineering College"), "government");
        assert_eq!(categorize("Bank of Baroda PO"), "banking");
        assert_eq!(categorize("Police Constable"), UNCATEGORIZED);
    }

    #[test]
    fn test_application_method_scan() {
        assert_eq!(application_method("APPLY ONLINE now"), ApplicationMethod::Online);
        assert_eq!(application_method("apply offline"), ApplicationMethod::Offline);
        assert_eq!(application_method("send by post"), ApplicationMethod::Unknown);
    }

    #[test]
    fn test_vacancy_text_fallback_in_record() {
        let page = r#"<div class="entry-content"><p>Total Posts: TBD</p></div>"#;
        let record = extractor().parse_record(page, "https://x/5", "t");
        assert_eq!(record.vacancies, Some(Vacancies::Text("TBD".to_string())));
    }
}
