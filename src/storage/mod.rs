//! Storage backends for scraped job records.
//!
//! Every run hands its records to one backend as a single batch:
//!
//! ```text
//! {directory}/
//! ├── {prefix}_YYYYmmdd_HHMMSS.json   # JsonStorage: one file per run
//! ├── {prefix}_YYYYmmdd_HHMMSS.csv    # CsvStorage: one file per run
//! └── {prefix}.db                     # SqliteStorage: upserted by URL
//! ```
//!
//! The same directory is read back by [`scan_prior_output`] to seed
//! deduplication for the next run.

pub mod csv_file;
pub mod json_file;
pub mod prior;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{StorageConfig, StorageFormat, StructuredRecord};

pub use csv_file::CsvStorage;
pub use json_file::JsonStorage;
pub use prior::scan_prior_output;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;

/// Trait for record storage backends.
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Persist one batch. Returns the written path, or `None` for an empty batch.
    async fn save(&self, records: &[StructuredRecord]) -> Result<Option<PathBuf>>;

    /// Format this backend writes.
    fn format(&self) -> StorageFormat;
}

/// Build the backend selected by configuration.
pub fn create_storage(config: &StorageConfig) -> Result<Box<dyn RecordStorage>> {
    let directory = PathBuf::from(&config.directory);
    let prefix = config.filename_prefix.clone();
    log::info!("Initialized storage with format: {}", config.format);

    match config.format {
        StorageFormat::Json => Ok(Box::new(JsonStorage::new(directory, prefix))),
        StorageFormat::Csv => Ok(Box::new(CsvStorage::new(directory, prefix))),
        #[cfg(feature = "sqlite")]
        StorageFormat::Sqlite => Ok(Box::new(SqliteStorage::new(directory, prefix))),
        #[cfg(not(feature = "sqlite"))]
        StorageFormat::Sqlite => Err(AppError::config(
            "storage.format = \"sqlite\" requires the `sqlite` feature",
        )),
    }
}

/// `{directory}/{prefix}_{YYYYmmdd_HHMMSS}.{ext}` for the current local time.
pub(crate) fn timestamped_path(directory: &Path, prefix: &str, format: StorageFormat) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    directory.join(format!("{prefix}_{stamp}.{}", format.extension()))
}

/// Write bytes atomically (write to temp, then rename), creating parent directories.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        AppError::storage(format!("failed to move {:?} into place: {}", path, e))
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{
        ApplicationMethod, ImportantDate, ImportantLink, StructuredRecord, Vacancies,
    };

    pub fn record(url: &str, title: &str) -> StructuredRecord {
        StructuredRecord {
            url: url.to_string(),
            title: title.to_string(),
            posted_date: Some("12 January 2025".to_string()),
            last_date: None,
            description: "Total Posts: 42".to_string(),
            apply_url: None,
            application_method: ApplicationMethod::Online,
            category: "government".to_string(),
            organization: Some("GPSC".to_string()),
            location: None,
            salary: None,
            vacancies: Some(Vacancies::Count(42)),
            qualification: None,
            experience: None,
            job_type: None,
            important_dates: vec![ImportantDate {
                event: "Last Date".to_string(),
                date: "28-02-2025".to_string(),
            }],
            important_links: vec![ImportantLink {
                kind: "Official Website".to_string(),
                url: "https://gpsc.gujarat.gov.in".to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_atomic_creates_dirs_and_leaves_no_temp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/out.json");

        write_atomic(&path, b"[]").await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"[]");
        assert!(!tmp.path().join("nested/out.tmp").exists());
    }

    #[test]
    fn test_timestamped_path_shape() {
        let path = timestamped_path(Path::new("data"), "jobs", StorageFormat::Csv);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("jobs_"));
        assert!(name.ends_with(".csv"));
        // jobs_ + YYYYmmdd_HHMMSS + .csv
        assert_eq!(name.len(), "jobs_".len() + 15 + ".csv".len());
    }

    #[test]
    fn test_create_storage_matches_format() {
        let mut config = StorageConfig::default();
        config.format = StorageFormat::Json;
        assert_eq!(create_storage(&config).unwrap().format(), StorageFormat::Json);
        config.format = StorageFormat::Csv;
        assert_eq!(create_storage(&config).unwrap().format(), StorageFormat::Csv);
    }
}
