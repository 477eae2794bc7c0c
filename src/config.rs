//! Configuration management for sponsorlens.
//!
//! Runtime settings come from the environment (`main` loads `.env` first).
//! The pattern tables come from a patterns file discovered with the prefer
//! crate, or from an explicit path, and fall back to the built-in tables.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::PatternTables;
use crate::ocr::OcrConfig;
use crate::services::search::DEFAULT_SEARCH_URL;
use crate::services::{NaverCredentials, OcrSettings};

/// Name used for patterns file discovery (`sponsorlens.toml`, `.yaml`, ...).
pub const CONFIG_NAME: &str = "sponsorlens";

/// Variables that must be set for the server to start.
const REQUIRED_ENV: &[&str] = &[
    "PORT",
    "APP_NAME",
    "WORKER_URL",
    "NAVER_CLIENT_ID",
    "NAVER_CLIENT_SECRET",
    "AWS_REGION",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SQS_QUEUE_URL",
];

const DEFAULT_OCR_TEMP_DIR: &str = "/tmp";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
    #[error("failed to read patterns file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse patterns file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("invalid pattern tables: {0}")]
    InvalidPatterns(String),
}

/// Queue and key-value store coordinates.
///
/// The crate ships in-process backends; these values identify the instance
/// in logs and are kept for deployments that plug in remote ones.
#[derive(Clone)]
pub struct AwsSettings {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub dynamodb_endpoint: Option<String>,
    pub sqs_queue_url: String,
}

impl fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSettings")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("dynamodb_endpoint", &self.dynamodb_endpoint)
            .field("sqs_queue_url", &self.sqs_queue_url)
            .finish()
    }
}

/// Everything read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub app_name: String,
    pub app_env: Option<String>,
    pub worker_url: String,
    pub naver: NaverCredentials,
    pub aws: AwsSettings,
    pub ocr_temp_dir: PathBuf,
    /// Deadline for a whole search request.
    pub request_timeout: Duration,
    pub tesseract_path: String,
    /// `None` for the default browser agent, `"impersonate"` for a random one.
    pub user_agent: Option<String>,
    pub patterns_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = REQUIRED_ENV
            .iter()
            .filter(|name| get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnv(missing));
        }
        let required = |name: &str| get(name).unwrap_or_default();

        let port_raw = required("PORT");
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: port_raw.clone(),
            })?;

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidValue {
                    name: "REQUEST_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            port,
            app_name: required("APP_NAME"),
            app_env: get("APP_ENV"),
            worker_url: required("WORKER_URL"),
            naver: NaverCredentials {
                client_id: required("NAVER_CLIENT_ID"),
                client_secret: required("NAVER_CLIENT_SECRET"),
                search_url: get("NAVER_SEARCH_URL")
                    .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            },
            aws: AwsSettings {
                region: required("AWS_REGION"),
                access_key_id: required("AWS_ACCESS_KEY_ID"),
                secret_access_key: required("AWS_SECRET_ACCESS_KEY"),
                dynamodb_endpoint: get("AWS_DYNAMODB_ENDPOINT"),
                sqs_queue_url: required("AWS_SQS_QUEUE_URL"),
            },
            ocr_temp_dir: PathBuf::from(
                get("OCR_TEMP_DIR").unwrap_or_else(|| DEFAULT_OCR_TEMP_DIR.to_string()),
            ),
            request_timeout,
            tesseract_path: get("TESSERACT_PATH").unwrap_or_else(|| "tesseract".to_string()),
            user_agent: get("HTTP_USER_AGENT"),
            patterns_file: get("SPONSOR_PATTERNS_FILE").map(PathBuf::from),
        })
    }

    /// Whether `APP_ENV` asks for development logging.
    pub fn is_dev(&self) -> bool {
        is_dev_env(self.app_env.as_deref())
    }

    pub fn ocr_settings(&self) -> OcrSettings {
        OcrSettings {
            worker_url: Some(self.worker_url.clone()),
            temp_dir: self.ocr_temp_dir.clone(),
            recognizer: OcrConfig {
                binary: self.tesseract_path.clone(),
                ..OcrConfig::default()
            },
            ..OcrSettings::default()
        }
    }
}

/// `dev` and `local` enable debug logging.
pub fn is_dev_env(app_env: Option<&str>) -> bool {
    matches!(
        app_env.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("dev") | Some("local")
    )
}

/// Load the pattern tables.
///
/// An explicit path must exist and parse. Otherwise prefer discovers a
/// `sponsorlens.*` file in the standard locations; without one the built-in
/// tables are used.
pub async fn load_patterns(explicit: Option<&Path>) -> Result<PatternTables, ConfigError> {
    if let Some(path) = explicit {
        return load_patterns_from_path(path).await;
    }
    match prefer::load(CONFIG_NAME).await {
        Ok(found) => match found.source_path() {
            Some(path) => {
                let path = path.to_path_buf();
                load_patterns_from_path(&path).await
            }
            None => Ok(PatternTables::default()),
        },
        Err(e) => {
            debug!("No patterns file discovered ({}), using built-in tables", e);
            Ok(PatternTables::default())
        }
    }
}

/// Load pattern tables from a TOML, YAML or JSON file (by extension).
///
/// Tables missing from the file keep their built-in values.
pub async fn load_patterns_from_path(path: &Path) -> Result<PatternTables, ConfigError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    let tables: PatternTables = match ext {
        "toml" => toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
        "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
        _ => serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
    };
    tables.validate().map_err(ConfigError::InvalidPatterns)?;

    info!(
        "Loaded pattern tables from {} ({} exact, {} weighted, {} sponsor domains)",
        path.display(),
        tables.exact.len(),
        tables.weighted.len(),
        tables.sponsor_domains.len()
    );
    Ok(tables)
}
