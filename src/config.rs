//! Service configuration parsed from environment variables.
//!
//! Every knob has a default so a bare `cargo run` serves an in-memory store
//! on port 3000. Invalid numeric values fall back to their defaults; an
//! unknown `CARD_STORE` or a backend missing its URL is a hard error.

use std::path::PathBuf;

use crate::db::DEFAULT_DB_MAX_CONNECTIONS;
use crate::placement::PlacementParams;
use crate::sticker::encode::DEFAULT_AVIF_SPEED;
use crate::sticker::{DEFAULT_TOLERANCE, EncodingBudget};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CARDS_PER_PAGE: usize = 10;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;
/// Card bodies embed stickers as data URIs; room for several at full budget.
pub const DEFAULT_CARD_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_SHEETS_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SHEETS_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown CARD_STORE: {0} (expected postgres, sheets, or memory)")]
    UnknownStore(String),
    #[error("missing required env var {0}")]
    Missing(&'static str),
}

/// Which card store backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Postgres { database_url: String, max_connections: u32 },
    Sheets(SheetsConfig),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub script_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

/// Sticker processing knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerConfig {
    /// Largest accepted upload, before any processing.
    pub max_upload_bytes: usize,
    pub budget: EncodingBudget,
    pub tolerance: f64,
    pub avif_speed: u8,
    /// Directory of default sticker images, if any.
    pub default_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub store: StoreConfig,
    pub static_dir: Option<PathBuf>,
    pub cards_per_page: usize,
    /// Largest card write body, on the REST card routes and `/exec`.
    pub card_max_body_bytes: usize,
    pub placement: PlacementParams,
    pub sticker: StickerConfig,
    pub migrate_legacy_positions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store: StoreConfig::Memory,
            static_dir: None,
            cards_per_page: DEFAULT_CARDS_PER_PAGE,
            card_max_body_bytes: DEFAULT_CARD_MAX_BODY_BYTES,
            placement: PlacementParams::default(),
            sticker: StickerConfig {
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
                budget: EncodingBudget::default(),
                tolerance: DEFAULT_TOLERANCE,
                avif_speed: DEFAULT_AVIF_SPEED,
                default_dir: None,
            },
            migrate_legacy_positions: false,
        }
    }
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// - `PORT`: default 3000
    /// - `CARD_STORE`: `postgres`, `sheets`, or `memory`. When absent, picks
    ///   `postgres` if `DATABASE_URL` is set, else `sheets` if
    ///   `SHEETS_SCRIPT_URL` is set, else `memory`.
    /// - `DATABASE_URL`, `DB_MAX_CONNECTIONS`
    /// - `SHEETS_SCRIPT_URL`, `SHEETS_REQUEST_TIMEOUT_SECS`, `SHEETS_CONNECT_TIMEOUT_SECS`
    /// - `STATIC_DIR`, `STICKER_DIR`
    /// - `CARDS_PER_PAGE`: default 10
    /// - `CARD_MAX_BODY_BYTES`: default 16 MiB
    /// - `PLACEMENT_MIN_DISTANCE`, `PLACEMENT_PADDING`, `PLACEMENT_MAX_ATTEMPTS`
    /// - `STICKER_MAX_UPLOAD_BYTES`, `STICKER_MAX_DATA_URI_LEN`, `STICKER_MAX_WIDTH`,
    ///   `STICKER_MAX_HEIGHT`, `STICKER_QUALITY`, `STICKER_MIN_QUALITY`,
    ///   `STICKER_TOLERANCE`, `AVIF_SPEED`
    /// - `MIGRATE_LEGACY_POSITIONS`: default false
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown store kind or a missing backend URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let placement_defaults = PlacementParams::default();
        let budget_defaults = EncodingBudget::default();

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT),
            store: store_from_env()?,
            static_dir: env_path("STATIC_DIR"),
            cards_per_page: env_parse("CARDS_PER_PAGE", DEFAULT_CARDS_PER_PAGE).max(1),
            card_max_body_bytes: env_parse("CARD_MAX_BODY_BYTES", DEFAULT_CARD_MAX_BODY_BYTES),
            placement: PlacementParams {
                min_distance: env_parse("PLACEMENT_MIN_DISTANCE", placement_defaults.min_distance),
                padding: env_parse("PLACEMENT_PADDING", placement_defaults.padding),
                max_attempts: env_parse("PLACEMENT_MAX_ATTEMPTS", placement_defaults.max_attempts),
            },
            sticker: StickerConfig {
                max_upload_bytes: env_parse("STICKER_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
                budget: EncodingBudget {
                    max_data_uri_len: env_parse("STICKER_MAX_DATA_URI_LEN", budget_defaults.max_data_uri_len),
                    initial_quality: env_parse("STICKER_QUALITY", budget_defaults.initial_quality).min(100),
                    min_quality: env_parse("STICKER_MIN_QUALITY", budget_defaults.min_quality).min(100),
                    max_width: env_parse("STICKER_MAX_WIDTH", budget_defaults.max_width).max(1),
                    max_height: env_parse("STICKER_MAX_HEIGHT", budget_defaults.max_height).max(1),
                },
                tolerance: env_parse("STICKER_TOLERANCE", DEFAULT_TOLERANCE),
                avif_speed: env_parse("AVIF_SPEED", DEFAULT_AVIF_SPEED),
                default_dir: env_path("STICKER_DIR"),
            },
            migrate_legacy_positions: env_parse("MIGRATE_LEGACY_POSITIONS", false),
        })
    }
}

fn store_from_env() -> Result<StoreConfig, ConfigError> {
    let database_url = env_non_empty("DATABASE_URL");
    let script_url = env_non_empty("SHEETS_SCRIPT_URL");

    let kind = match env_non_empty("CARD_STORE") {
        Some(kind) => kind,
        None if database_url.is_some() => "postgres".to_string(),
        None if script_url.is_some() => "sheets".to_string(),
        None => "memory".to_string(),
    };

    match kind.as_str() {
        "postgres" => Ok(StoreConfig::Postgres {
            database_url: database_url.ok_or(ConfigError::Missing("DATABASE_URL"))?,
            max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
        }),
        "sheets" => Ok(StoreConfig::Sheets(SheetsConfig {
            script_url: script_url.ok_or(ConfigError::Missing("SHEETS_SCRIPT_URL"))?,
            request_timeout_secs: env_parse("SHEETS_REQUEST_TIMEOUT_SECS", DEFAULT_SHEETS_REQUEST_TIMEOUT_SECS),
            connect_timeout_secs: env_parse("SHEETS_CONNECT_TIMEOUT_SECS", DEFAULT_SHEETS_CONNECT_TIMEOUT_SECS),
        })),
        "memory" => Ok(StoreConfig::Memory),
        other => Err(ConfigError::UnknownStore(other.to_string())),
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key).map_or(default, |v| v.trim().parse::<T>().unwrap_or(default))
}

fn env_non_empty(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_non_empty(key).map(PathBuf::from)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
