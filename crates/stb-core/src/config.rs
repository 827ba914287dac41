use std::{env, fs, path::PathBuf, time::Duration};

use crate::{errors::Error, Result};

/// Where log output goes. Read separately from [`Config`] so logging can be
/// up before the required settings are validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    pub error_log_path: PathBuf,
    pub combined_log_path: PathBuf,
    /// Filter directive used when `RUST_LOG` is not set.
    pub default_level: String,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_str)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            error_log_path: PathBuf::from(
                lookup("ERROR_LOG_PATH")
                    .and_then(non_empty)
                    .unwrap_or_else(|| "error.log".to_string()),
            ),
            combined_log_path: PathBuf::from(
                lookup("COMBINED_LOG_PATH")
                    .and_then(non_empty)
                    .unwrap_or_else(|| "combined.log".to_string()),
            ),
            default_level: "info".to_string(),
        }
    }
}

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub telegram_bot_token: String,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,

    // Downloads
    pub download_dir: PathBuf,

    // Deadlines for outbound calls
    pub request_timeout: Duration,
    pub download_timeout: Duration,

    // Per-chat memory of the last search
    pub session_ttl: Duration,

    pub logging: LogConfig,
}

impl Config {
    /// Load from the process environment (after `.env`, see [`load_dotenv`]) and
    /// make sure the download directory exists.
    pub fn load() -> Result<Self> {
        let cfg = Self::from_lookup(env_str)?;
        fs::create_dir_all(&cfg.download_dir)?;
        Ok(cfg)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .and_then(non_empty)
                .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
        };

        let telegram_bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let spotify_client_id = required("SPOTIFY_CLIENT_ID")?;
        let spotify_client_secret = required("SPOTIFY_CLIENT_SECRET")?;

        let download_dir = PathBuf::from(
            lookup("DOWNLOAD_DIR")
                .and_then(non_empty)
                .unwrap_or_else(|| "downloads".to_string()),
        );

        let millis = |key: &str, default: u64| {
            Duration::from_millis(lookup(key).and_then(parse_u64).unwrap_or(default))
        };
        let request_timeout = millis("REQUEST_TIMEOUT_MS", 20_000);
        let download_timeout = millis("DOWNLOAD_TIMEOUT_MS", 120_000);
        let session_ttl = Duration::from_secs(
            lookup("SESSION_TTL_SECS")
                .and_then(parse_u64)
                .unwrap_or(900),
        );

        Ok(Self {
            telegram_bot_token,
            spotify_client_id,
            spotify_client_secret,
            download_dir,
            request_timeout,
            download_timeout,
            session_ttl,
            logging: LogConfig::from_lookup(&lookup),
        })
    }
}

/// Load `.env` from the working directory if present. Existing variables win.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("ignoring unreadable .env file: {e}");
        }
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn parse_u64(s: String) -> Option<u64> {
    s.trim().parse::<u64>().ok()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
