//! Read back previous outputs to seed deduplication.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::PriorEntry;

/// Collect title/link pairs from every readable output file in `directory`.
///
/// A missing directory yields nothing. A file that cannot be read or parsed
/// is logged and skipped.
pub async fn scan_prior_output(directory: &Path) -> Vec<PriorEntry> {
    let files = match list_files(directory).await {
        Ok(files) => files,
        Err(e) => {
            if directory.exists() {
                log::warn!("Could not list {}: {}", directory.display(), e);
            }
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    for path in files {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let parsed = match ext {
            "json" => read_json(&path).await,
            "csv" => read_csv(&path).await,
            #[cfg(feature = "sqlite")]
            "db" => crate::storage::sqlite::read_prior_entries(&path).await,
            _ => continue,
        };
        match parsed {
            Ok(found) => {
                log::debug!("Loaded {} prior entries from {}", found.len(), path.display());
                entries.extend(found);
            }
            Err(e) => {
                log::warn!("Error loading existing jobs from {}: {}", path.display(), e);
            }
        }
    }
    entries
}

async fn list_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut dir = tokio::fs::read_dir(directory).await?;
    let mut files = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

async fn read_json(path: &Path) -> Result<Vec<PriorEntry>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_csv(path: &Path) -> Result<Vec<PriorEntry>> {
    let bytes = tokio::fs::read(path).await?;
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    reader
        .deserialize()
        .map(|row| row.map_err(Into::into))
        .collect()
}
