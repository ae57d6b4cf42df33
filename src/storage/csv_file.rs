//! Flat CSV output, one file per run.
//!
//! Columns follow the record field order. List fields are stored as JSON
//! strings and absent values as empty cells.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{StorageFormat, StructuredRecord};
use crate::storage::{RecordStorage, timestamped_path, write_atomic};

pub struct CsvStorage {
    directory: PathBuf,
    prefix: String,
}

impl CsvStorage {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    url: &'a str,
    title: &'a str,
    posted_date: Option<&'a str>,
    last_date: Option<&'a str>,
    description: &'a str,
    apply_url: Option<&'a str>,
    application_method: String,
    category: &'a str,
    organization: Option<&'a str>,
    location: Option<&'a str>,
    salary: Option<&'a str>,
    vacancies: Option<String>,
    qualification: Option<&'a str>,
    experience: Option<&'a str>,
    job_type: Option<&'a str>,
    important_dates: String,
    important_links: String,
}

impl<'a> CsvRow<'a> {
    fn from_record(record: &'a StructuredRecord) -> Result<Self> {
        Ok(Self {
            url: &record.url,
            title: &record.title,
            posted_date: record.posted_date.as_deref(),
            last_date: record.last_date.as_deref(),
            description: &record.description,
            apply_url: record.apply_url.as_deref(),
            application_method: record.application_method.to_string(),
            category: &record.category,
            organization: record.organization.as_deref(),
            location: record.location.as_deref(),
            salary: record.salary.as_deref(),
            vacancies: record.vacancies.as_ref().map(ToString::to_string),
            qualification: record.qualification.as_deref(),
            experience: record.experience.as_deref(),
            job_type: record.job_type.as_deref(),
            important_dates: serde_json::to_string(&record.important_dates)?,
            important_links: serde_json::to_string(&record.important_links)?,
        })
    }
}

/// Render records as CSV bytes with a header row.
pub fn to_csv_bytes(records: &[StructuredRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(CsvRow::from_record(record)?)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::storage(format!("failed to flush CSV buffer: {e}")))
}

#[async_trait]
impl RecordStorage for CsvStorage {
    async fn save(&self, records: &[StructuredRecord]) -> Result<Option<PathBuf>> {
        if records.is_empty() {
            log::warn!("No jobs to save");
            return Ok(None);
        }

        let path = timestamped_path(&self.directory, &self.prefix, StorageFormat::Csv);
        let bytes = to_csv_bytes(records)?;
        write_atomic(&path, &bytes).await?;

        log::info!("Saved {} jobs to CSV: {}", records.len(), path.display());
        Ok(Some(path))
    }

    fn format(&self) -> StorageFormat {
        StorageFormat::Csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixtures::record;
    use tempfile::TempDir;

    #[test]
    fn test_header_and_flattened_cells() {
        let bytes = to_csv_bytes(&[record("https://x/1", "GPSC Clerk")]).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers.first().map(String::as_str), Some("url"));
        assert_eq!(headers.last().map(String::as_str), Some("important_links"));
        assert_eq!(headers.len(), 17);

        let row = reader.records().next().unwrap().unwrap();
        let cell = |name: &str| {
            let i = headers.iter().position(|h| h == name).unwrap();
            row.get(i).unwrap().to_string()
        };
        assert_eq!(cell("vacancies"), "42");
        assert_eq!(cell("location"), "");
        assert_eq!(cell("application_method"), "online");
        assert_eq!(
            cell("important_dates"),
            r#"[{"event":"Last Date","date":"28-02-2025"}]"#
        );
        let links: serde_json::Value = serde_json::from_str(&cell("important_links")).unwrap();
        assert_eq!(links[0]["type"], "Official Website");
    }

    #[tokio::test]
    async fn test_save_names_file_with_prefix() {
        let tmp = TempDir::new().unwrap();
        let storage = CsvStorage::new(tmp.path(), "marugujarat_jobs");

        let path = storage
            .save(&[record("https://x/1", "GPSC Clerk")])
            .await
            .unwrap()
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("marugujarat_jobs_"));
        assert!(name.ends_with(".csv"));
        assert!(storage.save(&[]).await.unwrap().is_none());
    }
}
