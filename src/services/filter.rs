//! Keyword filter and title normalization.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Config;
use crate::utils::clean_text;

static PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([^)]*\)").expect("parenthesized-span pattern is valid")
});

const TITLE_DELIMITERS: [char; 3] = ['-', ':', '|'];

/// Whitelist/blacklist substring policy over listing titles.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    whitelist: Vec<String>,
    blacklist: Vec<String>,
}

impl KeywordFilter {
    /// Build a filter; keywords are lower-cased and blanks dropped.
    pub fn new<I, J, S, T>(whitelist: I, blacklist: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            whitelist: normalize_keywords(whitelist),
            blacklist: normalize_keywords(blacklist),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.whitelist_keywords, &config.blacklist_keywords)
    }

    /// Included iff the lower-cased title contains at least one whitelist
    /// substring and none of the blacklist substrings.
    pub fn should_include(&self, raw_title: &str) -> bool {
        let title = raw_title.to_lowercase();
        let whitelisted = self.whitelist.iter().any(|kw| title.contains(kw.as_str()));
        whitelisted && !self.blacklist.iter().any(|kw| title.contains(kw.as_str()))
    }

    /// Display-safe short title.
    ///
    /// Strips non-ASCII, drops parenthesized spans, keeps only the text
    /// before the first `-`, `:` or `|`, then collapses whitespace.
    pub fn clean_title(raw_title: &str) -> String {
        let ascii: String = raw_title.chars().filter(char::is_ascii).collect();
        let without_parens = PARENTHESIZED.replace_all(&ascii, "");
        let head = without_parens
            .split(TITLE_DELIMITERS)
            .next()
            .unwrap_or_default();
        clean_text(head)
    }

    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }
}

fn normalize_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|kw| kw.as_ref().trim().to_lowercase())
        .filter(|kw| !kw.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> KeywordFilter {
        KeywordFilter::new(["GPSC", "Clerk", "OJAS"], ["Apprentice", "Contract"])
    }

    #[test]
    fn test_whitelist_required() {
        let f = filter();
        assert!(f.should_include("GPSC Assistant Engineer Recruitment 2025"));
        assert!(!f.should_include("Bank Manager Recruitment 2025"));
    }

    #[test]
    fn test_blacklist_excludes() {
        let f = filter();
        assert!(!f.should_include("GPSC Apprentice Recruitment"));
        assert!(!f.should_include("Clerk on contract basis"));
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let f = filter();
        assert!(f.should_include("gpsc clerk"));
        // Substring, not word boundary
        assert!(f.should_include("UPGPSCX notice"));
        assert!(!f.should_include("Clerk (Contractual)"));
    }

    #[test]
    fn test_appending_blacklist_keyword_flips_inclusion() {
        let f = filter();
        let titles = ["GPSC Clerk Exam", "OJAS Notification", "Junior Clerk Bharti"];
        for title in titles {
            assert!(f.should_include(title), "{title}");
            for banned in f.blacklist() {
                let tainted = format!("{title} {banned}");
                assert!(!f.should_include(&tainted), "{tainted}");
            }
        }
    }

    #[test]
    fn test_blank_keywords_are_ignored() {
        let f = KeywordFilter::new(["", "  ", "clerk"], [" "]);
        assert_eq!(f.whitelist(), ["clerk".to_string()]);
        assert!(f.blacklist().is_empty());
        assert!(f.should_include("Senior Clerk"));
    }

    #[test]
    fn test_clean_title_pipeline() {
        assert_eq!(
            KeywordFilter::clean_title("Sr. Clerk (Temporary) - Apply Now | OJAS"),
            "Sr. Clerk"
        );
        assert_eq!(
            KeywordFilter::clean_title("🔥 GPSC Recruitment 2025: 120 Posts"),
            "GPSC Recruitment 2025"
        );
        assert_eq!(
            KeywordFilter::clean_title("HC Peon (Class IV) | Last Date"),
            "HC Peon"
        );
        assert_eq!(KeywordFilter::clean_title("  Talati   Exam  "), "Talati Exam");
        assert_eq!(KeywordFilter::clean_title("- leading delimiter"), "");
    }

    #[test]
    fn test_default_config_keywords() {
        let f = KeywordFilter::from_config(&Config::default());
        assert!(f.should_include("GSSSB Junior Clerk Recruitment 2025"));
        assert!(!f.should_include("Gujarat University Assistant Professor"));
    }
}
