//! Application configuration: where the database and output files live.
//!
//! Runtime settings (credential, region, endpoint, default folder) are kept
//! in the record store and edited through the `settings` command; this
//! module only decides which database file to open and what output folder
//! to seed it with on first run. Environment variables override the
//! defaults:
//!
//! - `TTSVAULT_DB`: path to the SQLite database file
//! - `TTSVAULT_OUTPUT_DIR`: output folder seeded into fresh settings

use std::path::PathBuf;

/// Database file in the working directory by default.
const DEFAULT_DB_FILE: &str = "ttsvault.db";

/// Output folder seeded into fresh settings by default.
const DEFAULT_OUTPUT_DIR: &str = "tts_outputs";

/// Paths the application operates on.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub output_dir: PathBuf,
}

impl AppConfig {
    /// Builds the configuration from environment variables, falling back
    /// to files in the current working directory.
    pub fn from_env() -> Self {
        let db_path = std::env::var_os("TTSVAULT_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
        let output_dir = std::env::var_os("TTSVAULT_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        Self {
            db_path,
            output_dir,
        }
    }
}
