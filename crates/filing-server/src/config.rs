//! Environment-driven server configuration.
//!
//! All knobs carry the `FILING_` prefix except `DATABASE_URL`. A malformed
//! numeric value is a startup error, never a silent fallback to the
//! default.

use std::path::PathBuf;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8085";
const DEFAULT_STORAGE_ROOT: &str = "./filing-storage";
const DEFAULT_EXPIRED_CHECK_SECS: u64 = 600;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;
const DEFAULT_FILE_TYPE: &str = "text/csv";
const DEFAULT_FILE_EXTENSION: &str = "csv";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is not a valid {kind}: {value}")]
    Malformed {
        var: &'static str,
        kind: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub http_addr: String,
    pub upload_root: PathBuf,
    pub download_root: PathBuf,
    /// Validation deadline enforced by the expiry watchdog.
    pub expired_check_secs: u64,
    pub max_upload_bytes: usize,
    pub file_type: String,
    pub file_extension: String,
    /// Base URL of the institution registry. The binary requires it; a
    /// library embedder may inject its own registry instead.
    pub institution_api_url: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| get(name).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let http_addr = get("FILING_HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.into());
        let upload_root = get("FILING_UPLOAD_ROOT")
            .unwrap_or_else(|| DEFAULT_STORAGE_ROOT.into())
            .into();
        let download_root = get("FILING_DOWNLOAD_ROOT")
            .unwrap_or_else(|| DEFAULT_STORAGE_ROOT.into())
            .into();
        let expired_check_secs = parse_or(
            get("FILING_EXPIRED_CHECK_SECS"),
            "FILING_EXPIRED_CHECK_SECS",
            "integer",
            DEFAULT_EXPIRED_CHECK_SECS,
        )?;
        let max_upload_bytes = parse_or(
            get("FILING_MAX_UPLOAD_BYTES"),
            "FILING_MAX_UPLOAD_BYTES",
            "integer",
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;
        let file_type = get("FILING_FILE_TYPE").unwrap_or_else(|| DEFAULT_FILE_TYPE.into());
        let file_extension =
            get("FILING_FILE_EXTENSION").unwrap_or_else(|| DEFAULT_FILE_EXTENSION.into());
        let institution_api_url = get("FILING_INSTITUTION_API_URL");

        Ok(Settings {
            database_url,
            http_addr,
            upload_root,
            download_root,
            expired_check_secs,
            max_upload_bytes,
            file_type,
            file_extension,
            institution_api_url,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    kind: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Malformed {
            var,
            kind,
            value,
        }),
    }
}
