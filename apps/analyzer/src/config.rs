use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_UPLOAD_DIR: &str = "Uploads";
const DEFAULT_S3_REGION: &str = "us-east-1";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where uploaded resumes live while a request is being analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local {
        upload_dir: PathBuf,
    },
    S3 {
        bucket: String,
        endpoint: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub storage: StorageConfig,
    /// Deadline for one model call. `None` leaves only the HTTP client timeout.
    pub llm_timeout: Option<Duration>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            storage: storage_from_env()?,
            llm_timeout: parse_llm_timeout(optional_env("LLM_TIMEOUT_SECS"))?,
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES")
                .map(|v| v.parse::<usize>().context("MAX_UPLOAD_BYTES must be a byte count"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            port: optional_env("PORT")
                .map(|v| v.parse::<u16>().context("PORT must be a valid port number"))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Unset means no deadline beyond the HTTP client's; zero is rejected.
fn parse_llm_timeout(value: Option<String>) -> Result<Option<Duration>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let secs = raw
        .trim()
        .parse::<u64>()
        .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?;
    if secs == 0 {
        bail!("LLM_TIMEOUT_SECS must be greater than zero");
    }
    Ok(Some(Duration::from_secs(secs)))
}

fn storage_from_env() -> Result<StorageConfig> {
    let backend = optional_env("STORAGE_BACKEND").unwrap_or_else(|| "local".to_string());
    parse_storage(&backend, optional_env)
}

/// Builds the storage config for `backend`, reading settings through `lookup`.
fn parse_storage(
    backend: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<StorageConfig> {
    let required = |key: &str| {
        lookup(key).with_context(|| {
            format!("Required environment variable '{key}' is not set (STORAGE_BACKEND={backend})")
        })
    };

    match backend.trim().to_ascii_lowercase().as_str() {
        "local" => Ok(StorageConfig::Local {
            upload_dir: lookup("UPLOAD_DIR")
                .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string())
                .into(),
        }),
        "s3" => Ok(StorageConfig::S3 {
            bucket: required("S3_BUCKET")?,
            endpoint: required("S3_ENDPOINT")?,
            region: lookup("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            access_key_id: required("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
        }),
        other => bail!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_local_backend_defaults_to_uploads_dir() {
        let storage = parse_storage("local", lookup(&[])).unwrap();
        assert_eq!(
            storage,
            StorageConfig::Local {
                upload_dir: PathBuf::from("Uploads")
            }
        );
    }

    #[test]
    fn test_local_backend_honours_upload_dir() {
        let storage = parse_storage("Local", lookup(&[("UPLOAD_DIR", "/var/tmp/resumes")])).unwrap();
        assert_eq!(
            storage,
            StorageConfig::Local {
                upload_dir: PathBuf::from("/var/tmp/resumes")
            }
        );
    }

    #[test]
    fn test_s3_backend_requires_bucket_and_credentials() {
        let err = parse_storage("s3", lookup(&[("S3_BUCKET", "resumes")])).unwrap_err();
        assert!(err.to_string().contains("S3_ENDPOINT"));

        let storage = parse_storage(
            "s3",
            lookup(&[
                ("S3_BUCKET", "resumes"),
                ("S3_ENDPOINT", "http://localhost:9000"),
                ("AWS_ACCESS_KEY_ID", "minio"),
                ("AWS_SECRET_ACCESS_KEY", "minio123"),
            ]),
        )
        .unwrap();
        assert!(matches!(
            storage,
            StorageConfig::S3 { ref region, ref bucket, .. } if region == "us-east-1" && bucket == "resumes"
        ));
    }

    #[test]
    fn test_llm_timeout_parsing() {
        assert_eq!(parse_llm_timeout(None).unwrap(), None);
        assert_eq!(
            parse_llm_timeout(Some("45".to_string())).unwrap(),
            Some(Duration::from_secs(45))
        );

        let err = parse_llm_timeout(Some("0".to_string())).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
        assert!(parse_llm_timeout(Some("soon".to_string())).is_err());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let err = parse_storage("ftp", lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("'ftp'"));
    }
}
