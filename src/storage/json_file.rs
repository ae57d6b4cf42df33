//! JSON array output, one file per run.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{StorageFormat, StructuredRecord};
use crate::storage::{RecordStorage, timestamped_path, write_atomic};

pub struct JsonStorage {
    directory: PathBuf,
    prefix: String,
}

impl JsonStorage {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl RecordStorage for JsonStorage {
    async fn save(&self, records: &[StructuredRecord]) -> Result<Option<PathBuf>> {
        if records.is_empty() {
            log::warn!("No jobs to save");
            return Ok(None);
        }

        let path = timestamped_path(&self.directory, &self.prefix, StorageFormat::Json);
        let bytes = serde_json::to_vec_pretty(records)?;
        write_atomic(&path, &bytes).await?;

        log::info!("Saved {} jobs to JSON: {}", records.len(), path.display());
        Ok(Some(path))
    }

    fn format(&self) -> StorageFormat {
        StorageFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixtures::record;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_writes_pretty_array() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonStorage::new(tmp.path(), "jobs");

        let path = storage
            .save(&[record("https://x/1", "GPSC Clerk")])
            .await
            .unwrap()
            .unwrap();

        let loaded: Vec<StructuredRecord> =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(loaded, vec![record("https://x/1", "GPSC Clerk")]);

        let raw: serde_json::Value =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(raw[0]["vacancies"], 42);
        assert_eq!(raw[0]["application_method"], "online");
        assert_eq!(raw[0]["important_links"][0]["type"], "Official Website");
    }

    #[tokio::test]
    async fn test_empty_batch_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonStorage::new(tmp.path().join("out"), "jobs");

        assert!(storage.save(&[]).await.unwrap().is_none());
        assert!(!tmp.path().join("out").exists());
    }
}
