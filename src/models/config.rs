//! Application configuration structures.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::FieldSelectors;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listing page of the remote site; also the base for relative links
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Number of listing pages fetched per run
    #[serde(default = "defaults::pages_to_scrape")]
    pub pages_to_scrape: u32,

    /// A title must contain at least one of these (case-insensitive)
    #[serde(default = "defaults::whitelist_keywords")]
    pub whitelist_keywords: Vec<String>,

    /// A title must contain none of these (case-insensitive)
    #[serde(default = "defaults::blacklist_keywords")]
    pub blacklist_keywords: Vec<String>,

    /// Pagination request shape
    #[serde(default)]
    pub listing: ListingConfig,

    /// Detail page request shape
    #[serde(default)]
    pub detail: DetailConfig,

    /// Detail page selectors
    #[serde(default)]
    pub selectors: FieldSelectors,

    /// HTTP transport tuning
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Output settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log filter
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Interval for the scheduled runner
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults only when the file is absent.
    ///
    /// A file that exists but does not parse is a configuration defect and is returned as an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Config file {:?} not found. Using defaults.", path);
                Ok(Self::default())
            }
            Err(e) => Err(AppError::config(format!(
                "Failed to read config from {:?}: {}",
                path, e
            ))),
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        require_absolute_url("base_url", &self.base_url)?;
        require_absolute_url("listing.endpoint", &self.listing.endpoint)?;

        if self.pages_to_scrape == 0 {
            return Err(AppError::validation("pages_to_scrape must be > 0"));
        }
        if self.whitelist_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(AppError::validation("whitelist_keywords is empty"));
        }
        if self.listing.page_param.trim().is_empty() {
            return Err(AppError::validation("listing.page_param is empty"));
        }
        if self.scraper.request_timeout == 0 {
            return Err(AppError::validation("scraper.request_timeout must be > 0"));
        }
        if self.scraper.max_retries == 0 {
            return Err(AppError::validation("scraper.max_retries must be > 0"));
        }
        if !self.scraper.retry_delay.is_finite() || self.scraper.retry_delay < 0.0 {
            return Err(AppError::validation(
                "scraper.retry_delay must be a non-negative number of seconds",
            ));
        }
        if let Some(rate_limit) = &self.scraper.rate_limit {
            if rate_limit.requests_per_minute == 0 {
                return Err(AppError::validation(
                    "scraper.rate_limit.requests_per_minute must be > 0",
                ));
            }
        }
        if self.storage.directory.trim().is_empty() {
            return Err(AppError::validation("storage.directory is empty"));
        }
        if self.storage.filename_prefix.trim().is_empty() {
            return Err(AppError::validation("storage.filename_prefix is empty"));
        }
        if self.schedule.interval_hours == 0 {
            return Err(AppError::validation("schedule.interval_hours must be > 0"));
        }
        Ok(())
    }
}

fn require_absolute_url(key: &str, value: &str) -> Result<()> {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(AppError::validation(format!(
            "{key} must be an absolute http(s) URL, got '{value}'"
        ))),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            pages_to_scrape: defaults::pages_to_scrape(),
            whitelist_keywords: defaults::whitelist_keywords(),
            blacklist_keywords: defaults::blacklist_keywords(),
            listing: ListingConfig::default(),
            detail: DetailConfig::default(),
            selectors: FieldSelectors::default(),
            scraper: ScraperConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

/// HTTP verb used for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// Pagination request settings for the listing feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Endpoint that serves listing pages
    #[serde(default = "defaults::listing_endpoint")]
    pub endpoint: String,

    /// Request method for listing pages
    #[serde(default = "defaults::listing_method")]
    pub method: HttpMethod,

    /// Name of the parameter carrying the page index
    #[serde(default = "defaults::page_param")]
    pub page_param: String,

    /// Selector for each listing entry's anchor
    #[serde(default = "defaults::entry_selector")]
    pub entry_selector: String,

    /// Fixed protocol parameters sent with every page request
    #[serde(default = "defaults::listing_form")]
    pub form: BTreeMap<String, String>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::listing_endpoint(),
            method: defaults::listing_method(),
            page_param: defaults::page_param(),
            entry_selector: defaults::entry_selector(),
            form: defaults::listing_form(),
        }
    }
}

/// Detail page request settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DetailConfig {
    /// Request method for detail pages
    #[serde(default)]
    pub method: HttpMethod,
}

/// HTTP client and retry behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Request timeout in seconds
    #[serde(default = "defaults::request_timeout")]
    pub request_timeout: u64,

    /// Total attempts per request
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts in seconds (jitter is added on top)
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay: f64,

    /// Pick a random User-Agent per request unless one is given explicitly
    #[serde(default = "defaults::user_agent_rotation")]
    pub user_agent_rotation: bool,

    /// Pool used for rotation
    #[serde(default = "defaults::user_agents")]
    pub user_agents: Vec<String>,

    /// Agent used when rotation is off or the pool is empty
    #[serde(default = "defaults::fallback_user_agent")]
    pub fallback_user_agent: String,

    /// Headers sent with every request unless overridden per call
    #[serde(default = "defaults::headers")]
    pub headers: BTreeMap<String, String>,

    /// Optional blocking throttle
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_timeout: defaults::request_timeout(),
            max_retries: defaults::max_retries(),
            retry_delay: defaults::retry_delay(),
            user_agent_rotation: defaults::user_agent_rotation(),
            user_agents: defaults::user_agents(),
            fallback_user_agent: defaults::fallback_user_agent(),
            headers: defaults::headers(),
            rate_limit: None,
        }
    }
}

/// Requests-per-minute throttle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "defaults::requests_per_minute")]
    pub requests_per_minute: u32,
}

/// Serialized output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    #[default]
    Csv,
    Json,
    Sqlite,
}

impl StorageFormat {
    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            StorageFormat::Csv => "csv",
            StorageFormat::Json => "json",
            StorageFormat::Sqlite => "db",
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageFormat::Csv => f.write_str("csv"),
            StorageFormat::Json => f.write_str("json"),
            StorageFormat::Sqlite => f.write_str("sqlite"),
        }
    }
}

impl std::str::FromStr for StorageFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(StorageFormat::Csv),
            "json" => Ok(StorageFormat::Json),
            "sqlite" => Ok(StorageFormat::Sqlite),
            other => Err(AppError::config(format!(
                "Unsupported storage format: {other}"
            ))),
        }
    }
}

/// Output location and format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub format: StorageFormat,

    #[serde(default = "defaults::storage_directory")]
    pub directory: String,

    #[serde(default = "defaults::filename_prefix")]
    pub filename_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            format: StorageFormat::default(),
            directory: defaults::storage_directory(),
            filename_prefix: defaults::filename_prefix(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Also append log lines to this file (parent directories are created)
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            file: None,
        }
    }
}

/// Scheduled runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "defaults::interval_hours")]
    pub interval_hours: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: defaults::interval_hours(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;

    use super::HttpMethod;

    pub fn base_url() -> String {
        "https://www.marugujarat.in/maru-gujarat/".into()
    }
    pub fn pages_to_scrape() -> u32 {
        3
    }

    // Keyword defaults
    pub fn whitelist_keywords() -> Vec<String> {
        [
            "GPSC",
            "GSSSB",
            "Talati",
            "TET",
            "HTAT",
            "TAT",
            "Clerk",
            "PSI",
            "Police",
            "Constable",
            "Gujarat",
            "OJAS",
            "High Court",
            "HC",
            "LRD",
            "Bharti",
            "Exam",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn blacklist_keywords() -> Vec<String> {
        [
            "University",
            "Apprentice",
            "Apprenticeship",
            "Contract",
            "Outsourcing",
            "District Project Coordinator",
            "Project Coordinator",
            "Project",
            "Contractual",
            "Operator",
            "Walk-in Interview",
            "Rozgaar Bharti Melo",
            "Consultant",
            "CSIR",
            "CSMCRI",
            "Samagra Shiksha",
            "College",
            "Hospital",
            "IRMA",
            "TB",
            "GMERS",
            "GNLU",
            "Shikshan Sahayak",
            "Nagarpalika",
            "Part-Time",
            "Technician",
            "Paper",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    // Listing defaults
    pub fn listing_endpoint() -> String {
        "https://www.marugujarat.in/wp-admin/admin-ajax.php".into()
    }
    pub fn listing_method() -> HttpMethod {
        HttpMethod::Post
    }
    pub fn page_param() -> String {
        "page".into()
    }
    pub fn entry_selector() -> String {
        "h4.pt-cv-title a".into()
    }
    pub fn listing_form() -> BTreeMap<String, String> {
        [
            ("action", "pagination_request"),
            ("sid", "f2c0a65lf2"),
            ("unid", ""),
            ("isblock", ""),
            ("postid", ""),
            ("lang", ""),
            ("ajax_nonce", "7b50977e00"),
            ("custom_data[sf_taxo]", "{}"),
            ("custom_data[sf_opera]", "{}"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    // Transport defaults
    pub fn request_timeout() -> u64 {
        30
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_delay() -> f64 {
        5.0
    }
    pub fn user_agent_rotation() -> bool {
        true
    }
    pub fn user_agents() -> Vec<String> {
        [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36",
            "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn fallback_user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
    }
    pub fn headers() -> BTreeMap<String, String> {
        [
            ("accept", "*/*"),
            ("accept-language", "en-US,en;q=0.9"),
            ("cache-control", "no-cache"),
            ("origin", "https://www.marugujarat.in"),
            ("pragma", "no-cache"),
            ("referer", "https://www.marugujarat.in/maru-gujarat/"),
            ("x-requested-with", "XMLHttpRequest"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }
    pub fn requests_per_minute() -> u32 {
        10
    }

    // Storage defaults
    pub fn storage_directory() -> String {
        "data/processed".into()
    }
    pub fn filename_prefix() -> String {
        "marugujarat_jobs".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
    pub fn interval_hours() -> u64 {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_pages() {
        let mut config = Config::default();
        config.pages_to_scrape = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_relative_base_url() {
        let mut config = Config::default();
        config.base_url = "/maru-gujarat/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_rate_limit() {
        let mut config = Config::default();
        config.scraper.rate_limit = Some(RateLimitConfig {
            requests_per_minute: 0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_whitelist() {
        let mut config = Config::default();
        config.whitelist_keywords = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            pages_to_scrape = 5

            [scraper]
            max_retries = 4

            [scraper.rate_limit]

            [storage]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.pages_to_scrape, 5);
        assert_eq!(config.scraper.max_retries, 4);
        assert_eq!(config.scraper.request_timeout, 30);
        assert_eq!(
            config.scraper.rate_limit.unwrap().requests_per_minute,
            10
        );
        assert_eq!(config.storage.format, StorageFormat::Json);
        assert_eq!(config.storage.directory, "data/processed");
        assert_eq!(config.listing.method, HttpMethod::Post);
        assert_eq!(config.detail.method, HttpMethod::Get);
        assert_eq!(config.selectors.title, "h1.entry-title");
        assert!(config.whitelist_keywords.contains(&"GPSC".to_string()));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn logging_file_target_is_read() {
        let config: Config = toml::from_str(
            r#"
            [logging]
            level = "debug"
            file = "logs/scraper.log"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("logs/scraper.log"));
    }

    #[test]
    fn unknown_storage_format_is_rejected() {
        let parsed: std::result::Result<Config, _> = toml::from_str(
            r#"
            [storage]
            format = "parquet"
            "#,
        );
        assert!(parsed.is_err());
        assert!("parquet".parse::<StorageFormat>().is_err());
        assert_eq!("SQLite".parse::<StorageFormat>().unwrap(), StorageFormat::Sqlite);
    }

    #[test]
    fn load_or_default_handles_missing_and_malformed_files() {
        let tmp = tempfile::TempDir::new().unwrap();

        let missing = tmp.path().join("absent.toml");
        let config = Config::load_or_default(&missing).unwrap();
        assert_eq!(config.pages_to_scrape, 3);

        let broken = tmp.path().join("broken.toml");
        fs::write(&broken, "pages_to_scrape = [").unwrap();
        let err = Config::load_or_default(&broken).unwrap_err();
        assert!(err.is_config_defect());
    }
}
