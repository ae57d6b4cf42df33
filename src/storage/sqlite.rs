//! SQLite output: one database accumulated across runs.
//!
//! Jobs are upserted by URL. A job's dates and links are replaced on every
//! upsert (delete, then reinsert) so no orphaned child rows remain. Each
//! batch is written in one transaction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use crate::error::Result;
use crate::models::{PriorEntry, StorageFormat, StructuredRecord};
use crate::storage::RecordStorage;

const CREATE_JOBS: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT UNIQUE,
    title TEXT,
    posted_date TEXT,
    last_date TEXT,
    description TEXT,
    apply_url TEXT,
    application_method TEXT,
    category TEXT,
    organization TEXT,
    location TEXT,
    salary TEXT,
    vacancies TEXT,
    qualification TEXT,
    experience TEXT,
    job_type TEXT,
    scraped_at TEXT
)";

const CREATE_DATES: &str = "
CREATE TABLE IF NOT EXISTS important_dates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER,
    event TEXT,
    date TEXT,
    FOREIGN KEY (job_id) REFERENCES jobs (id)
)";

const CREATE_LINKS: &str = "
CREATE TABLE IF NOT EXISTS important_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER,
    type TEXT,
    url TEXT,
    FOREIGN KEY (job_id) REFERENCES jobs (id)
)";

pub struct SqliteStorage {
    directory: PathBuf,
    prefix: String,
}

impl SqliteStorage {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    /// `{directory}/{prefix}.db`
    pub fn database_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.prefix, StorageFormat::Sqlite.extension()))
    }

    async fn connect(&self) -> Result<SqlitePool> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let options = SqliteConnectOptions::new()
            .filename(self.database_path())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        for statement in [CREATE_JOBS, CREATE_DATES, CREATE_LINKS] {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(pool)
    }
}

/// Insert or update one job and replace its child rows.
async fn upsert(
    tx: &mut Transaction<'_, Sqlite>,
    record: &StructuredRecord,
    scraped_at: &str,
) -> Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM jobs WHERE url = ?")
        .bind(&record.url)
        .fetch_optional(&mut **tx)
        .await?;

    let method = record.application_method.to_string();
    let vacancies = record.vacancies.as_ref().map(ToString::to_string);

    let job_id = match existing {
        Some(id) => {
            sqlx::query(
                "UPDATE jobs SET title = ?, posted_date = ?, last_date = ?, description = ?,
                 apply_url = ?, application_method = ?, category = ?, organization = ?,
                 location = ?, salary = ?, vacancies = ?, qualification = ?, experience = ?,
                 job_type = ?, scraped_at = ? WHERE id = ?",
            )
            .bind(&record.title)
            .bind(record.posted_date.as_deref())
            .bind(record.last_date.as_deref())
            .bind(&record.description)
            .bind(record.apply_url.as_deref())
            .bind(&method)
            .bind(&record.category)
            .bind(record.organization.as_deref())
            .bind(record.location.as_deref())
            .bind(record.salary.as_deref())
            .bind(vacancies.as_deref())
            .bind(record.qualification.as_deref())
            .bind(record.experience.as_deref())
            .bind(record.job_type.as_deref())
            .bind(scraped_at)
            .bind(id)
            .execute(&mut **tx)
            .await?;

            sqlx::query("DELETE FROM important_dates WHERE job_id = ?")
                .bind(id)
                .execute(&mut **tx)
                .await?;
            sqlx::query("DELETE FROM important_links WHERE job_id = ?")
                .bind(id)
                .execute(&mut **tx)
                .await?;
            id
        }
        None => sqlx::query(
            "INSERT INTO jobs (url, title, posted_date, last_date, description, apply_url,
             application_method, category, organization, location, salary, vacancies,
             qualification, experience, job_type, scraped_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.url)
        .bind(&record.title)
        .bind(record.posted_date.as_deref())
        .bind(record.last_date.as_deref())
        .bind(&record.description)
        .bind(record.apply_url.as_deref())
        .bind(&method)
        .bind(&record.category)
        .bind(record.organization.as_deref())
        .bind(record.location.as_deref())
        .bind(record.salary.as_deref())
        .bind(vacancies.as_deref())
        .bind(record.qualification.as_deref())
        .bind(record.experience.as_deref())
        .bind(record.job_type.as_deref())
        .bind(scraped_at)
        .execute(&mut **tx)
        .await?
        .last_insert_rowid(),
    };

    for date in &record.important_dates {
        sqlx::query("INSERT INTO important_dates (job_id, event, date) VALUES (?, ?, ?)")
            .bind(job_id)
            .bind(&date.event)
            .bind(&date.date)
            .execute(&mut **tx)
            .await?;
    }
    for link in &record.important_links {
        sqlx::query("INSERT INTO important_links (job_id, type, url) VALUES (?, ?, ?)")
            .bind(job_id)
            .bind(&link.kind)
            .bind(&link.url)
            .execute(&mut **tx)
            .await?;
    }

    Ok(job_id)
}

#[async_trait]
impl RecordStorage for SqliteStorage {
    async fn save(&self, records: &[StructuredRecord]) -> Result<Option<PathBuf>> {
        if records.is_empty() {
            log::warn!("No jobs to save");
            return Ok(None);
        }

        let pool = self.connect().await?;
        let scraped_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut tx = pool.begin().await?;
        for record in records {
            upsert(&mut tx, record, &scraped_at).await?;
        }
        tx.commit().await?;
        pool.close().await;

        let path = self.database_path();
        log::info!(
            "Saved {} jobs to SQLite database: {}",
            records.len(),
            path.display()
        );
        Ok(Some(path))
    }

    fn format(&self) -> StorageFormat {
        StorageFormat::Sqlite
    }
}

/// Title and URL of every stored job, opened read-only.
pub async fn read_prior_entries(path: &Path) -> Result<Vec<PriorEntry>> {
    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    let rows: Vec<(Option<String>, Option<String>)> =
        sqlx::query_as("SELECT title, url FROM jobs")
            .fetch_all(&pool)
            .await?;
    pool.close().await;

    Ok(rows
        .into_iter()
        .map(|(title, url)| PriorEntry {
            title,
            link: None,
            url,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImportantLink;
    use crate::storage::fixtures::record;
    use tempfile::TempDir;

    async fn count(pool: &SqlitePool, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_by_url_replaces_children() {
        let tmp = TempDir::new().unwrap();
        let storage = SqliteStorage::new(tmp.path(), "jobs");

        let first = record("https://x/1", "GPSC Clerk");
        storage.save(&[first.clone()]).await.unwrap();

        let mut updated = first.clone();
        updated.title = "GPSC Clerk (Revised)".to_string();
        updated.important_links.push(ImportantLink {
            kind: "Notification".to_string(),
            url: "https://x/notice.pdf".to_string(),
        });
        let path = storage
            .save(&[updated, record("https://x/2", "Talati")])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(path, tmp.path().join("jobs.db"));

        let pool = storage.connect().await.unwrap();
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM jobs").await, 2);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM important_dates").await, 2);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM important_links").await, 3);

        let title: String = sqlx::query_scalar("SELECT title FROM jobs WHERE url = ?")
            .bind("https://x/1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(title, "GPSC Clerk (Revised)");

        let vacancies: Option<String> =
            sqlx::query_scalar("SELECT vacancies FROM jobs WHERE url = ?")
                .bind("https://x/2")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(vacancies.as_deref(), Some("42"));
        pool.close().await;
    }

    #[tokio::test]
    async fn test_read_prior_entries() {
        let tmp = TempDir::new().unwrap();
        let storage = SqliteStorage::new(tmp.path(), "jobs");
        storage
            .save(&[record("https://x/1", "GPSC Clerk")])
            .await
            .unwrap();

        let entries = read_prior_entries(&storage.database_path()).await.unwrap();
        assert_eq!(entries.len(), 1);
        let keys: Vec<&str> = entries[0].keys().collect();
        assert_eq!(keys, vec!["GPSC Clerk", "https://x/1"]);
    }
}
