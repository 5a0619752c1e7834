//! Process configuration, read once from the environment at startup.
//!
//! `DATABASE_URL` and `WEBHOOK_URL` are optional here on purpose: a missing
//! value only surfaces when a job needs it, as a job failure.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_CHUNK_SIZE: usize = 50_000;
const DEFAULT_DRIVE_BASE_URL: &str = "https://drive.google.com";
const DEFAULT_SHEETS_BASE_URL: &str = "https://docs.google.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite database file receiving the per-owner tables.
    pub database_url: Option<String>,
    pub webhook_url: Option<String>,
    pub chunk_size: usize,
    pub drive_base_url: String,
    pub sheets_base_url: String,
    /// Directory for staged Drive downloads; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "127.0.0.1"),
            port: env_opt("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            database_url: env_opt("DATABASE_URL"),
            webhook_url: env_opt("WEBHOOK_URL"),
            chunk_size: parse_chunk_size(env_opt("CHUNK_SIZE").as_deref()),
            drive_base_url: env_or("DRIVE_BASE_URL", DEFAULT_DRIVE_BASE_URL),
            sheets_base_url: env_or("SHEETS_BASE_URL", DEFAULT_SHEETS_BASE_URL),
            temp_dir: env_opt("TEMP_DIR").map(PathBuf::from),
        }
    }

    /// Filesystem path of the SQLite database, with any `sqlite://` scheme removed.
    pub fn database_path(&self) -> Option<String> {
        self.database_url.as_deref().map(|url| {
            url.strip_prefix("sqlite://")
                .or_else(|| url.strip_prefix("sqlite:"))
                .unwrap_or(url)
                .to_string()
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: None,
            webhook_url: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            drive_base_url: DEFAULT_DRIVE_BASE_URL.to_string(),
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            temp_dir: None,
        }
    }
}

fn parse_chunk_size(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_CHUNK_SIZE)
}
