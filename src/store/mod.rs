//! Local record store: settings plus conversion history, backed by SQLite.
//!
//! The store holds a single-row settings record (credential, region,
//! endpoint, default output folder) and an append-only history of completed
//! conversions. History rows are queried by fingerprint for duplicate
//! detection and by id for browsing, replaying, and deletion.
//!
//! This is a single-user, single-process tool; SQLite's own serialization
//! is the only concurrent-writer protection, and the pool is capped at one
//! connection to keep writes ordered.

use std::path::{Path, PathBuf};

use chrono::Local;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use crate::errors::{StoreError, StoreResult};
use crate::synth::tts_rest_url;

/// Default Azure region seeded on first run.
pub const DEFAULT_REGION: &str = "northcentralus";

/// Timestamp format for history rows.
const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Maximum characters of source text kept in a listing preview.
const PREVIEW_CHARS: usize = 80;

/// The single-row settings record.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Settings {
    /// Subscription key for the synthesis service. Blank until configured.
    pub api_key: String,
    /// Azure region, e.g. "northcentralus".
    pub region: String,
    /// Full synthesis endpoint URL.
    pub endpoint: String,
    /// Folder where output audio files land by default.
    pub default_folder: PathBuf,
}

impl Settings {
    /// Seeded defaults: blank credential, default region, region-derived
    /// endpoint, and the given output folder.
    pub fn seeded(default_folder: &Path) -> Self {
        Self {
            api_key: String::new(),
            region: DEFAULT_REGION.to_string(),
            endpoint: tts_rest_url(DEFAULT_REGION),
            default_folder: default_folder.to_path_buf(),
        }
    }
}

/// A persisted record of one completed conversion.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: i64,
    pub created_at: String,
    pub text: String,
    pub voice: String,
    pub style: String,
    pub output_format: String,
    pub fingerprint: String,
    pub file_path: PathBuf,
}

/// A history row shaped for listing: full text replaced by a preview.
#[derive(Debug, Clone)]
pub struct HistoryListing {
    pub id: i64,
    pub created_at: String,
    pub voice: String,
    pub style: String,
    pub output_format: String,
    pub file_path: PathBuf,
    pub preview: String,
}

/// Fields of a history entry supplied by the caller; id and timestamp are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub text: String,
    pub voice: String,
    pub style: String,
    pub output_format: String,
    pub fingerprint: String,
    pub file_path: PathBuf,
}

/// SQLite-backed settings and history store.
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Opens (creating if necessary) the database at `db_path` and ensures
    /// the schema exists. Seeds default settings pointing output at
    /// `default_folder` when no settings row is present yet; an existing
    /// row is left untouched, so `open` is idempotent.
    pub async fn open(db_path: &Path, default_folder: &Path) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init(default_folder).await?;
        Ok(store)
    }

    /// Creates tables and seeds the settings row if absent.
    async fn init(&self, default_folder: &Path) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS settings (
                 id INTEGER PRIMARY KEY CHECK (id = 1),
                 api_key TEXT NOT NULL,
                 region TEXT NOT NULL,
                 endpoint TEXT NOT NULL,
                 default_folder TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tts_history (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 created_at TEXT NOT NULL,
                 text TEXT NOT NULL,
                 voice TEXT NOT NULL,
                 style TEXT NOT NULL,
                 output_format TEXT NOT NULL,
                 fingerprint TEXT NOT NULL,
                 file_path TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_tts_history_fingerprint
             ON tts_history (fingerprint)",
        )
        .execute(&self.pool)
        .await?;

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM settings WHERE id = 1")
            .fetch_one(&self.pool)
            .await?
            .try_get("n")?;

        if count == 0 {
            let seeded = Settings::seeded(default_folder);
            debug!("seeding default settings (region {})", seeded.region);
            sqlx::query(
                "INSERT INTO settings (id, api_key, region, endpoint, default_folder)
                 VALUES (1, ?, ?, ?, ?)",
            )
            .bind(&seeded.api_key)
            .bind(&seeded.region)
            .bind(&seeded.endpoint)
            .bind(seeded.default_folder.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Loads the settings record.
    pub async fn load_settings(&self) -> StoreResult<Settings> {
        let row = sqlx::query(
            "SELECT api_key, region, endpoint, default_folder FROM settings WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Settings {
            api_key: row.try_get("api_key")?,
            region: row.try_get("region")?,
            endpoint: row.try_get("endpoint")?,
            default_folder: PathBuf::from(row.try_get::<String, _>("default_folder")?),
        })
    }

    /// Replaces the settings record as a whole.
    pub async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        sqlx::query(
            "UPDATE settings SET api_key = ?, region = ?, endpoint = ?, default_folder = ?
             WHERE id = 1",
        )
        .bind(&settings.api_key)
        .bind(&settings.region)
        .bind(&settings.endpoint)
        .bind(settings.default_folder.to_string_lossy().into_owned())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Appends a history entry and returns its assigned id.
    pub async fn add_history(&self, entry: &NewHistoryEntry) -> StoreResult<i64> {
        let created_at = Local::now().format(ROW_TIMESTAMP_FORMAT).to_string();
        let result = sqlx::query(
            "INSERT INTO tts_history
                 (created_at, text, voice, style, output_format, fingerprint, file_path)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&created_at)
        .bind(&entry.text)
        .bind(&entry.voice)
        .bind(&entry.style)
        .bind(&entry.output_format)
        .bind(&entry.fingerprint)
        .bind(entry.file_path.to_string_lossy().into_owned())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Returns history entries matching a fingerprint, most recent first.
    pub async fn find_by_fingerprint(&self, fingerprint: &str) -> StoreResult<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            "SELECT id, created_at, text, voice, style, output_format, fingerprint, file_path
             FROM tts_history WHERE fingerprint = ?
             ORDER BY id DESC",
        )
        .bind(fingerprint)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Lists all history rows, most recent first, with a truncated preview
    /// of the source text.
    pub async fn list_history(&self) -> StoreResult<Vec<HistoryListing>> {
        let rows = sqlx::query(
            "SELECT id, created_at, text, voice, style, output_format, file_path
             FROM tts_history ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in &rows {
            let text: String = row.try_get("text")?;
            listings.push(HistoryListing {
                id: row.try_get("id")?,
                created_at: row.try_get("created_at")?,
                voice: row.try_get("voice")?,
                style: row.try_get("style")?,
                output_format: row.try_get("output_format")?,
                file_path: PathBuf::from(row.try_get::<String, _>("file_path")?),
                preview: preview_text(&text),
            });
        }
        Ok(listings)
    }

    /// Fetches a single history entry by id.
    pub async fn get_history_item(&self, id: i64) -> StoreResult<Option<HistoryEntry>> {
        let row = sqlx::query(
            "SELECT id, created_at, text, voice, style, output_format, fingerprint, file_path
             FROM tts_history WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    /// Deletes a history entry and, best-effort, its audio file.
    ///
    /// A missing or undeletable file is logged and ignored; the metadata
    /// row is removed unconditionally. Returns [`StoreError::NotFound`] if
    /// no entry has the given id.
    pub async fn delete_history_item(&self, id: i64) -> StoreResult<()> {
        let entry = self
            .get_history_item(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        if let Err(e) = tokio::fs::remove_file(&entry.file_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("could not remove {}: {}", entry.file_path.display(), e);
            }
        }

        sqlx::query("DELETE FROM tts_history WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> StoreResult<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        text: row.try_get("text")?,
        voice: row.try_get("voice")?,
        style: row.try_get("style")?,
        output_format: row.try_get("output_format")?,
        fingerprint: row.try_get("fingerprint")?,
        file_path: PathBuf::from(row.try_get::<String, _>("file_path")?),
    })
}

/// Truncates text to the preview length on a character boundary, appending
/// an ellipsis when anything was cut.
fn preview_text(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push('…');
    }
    preview
}
