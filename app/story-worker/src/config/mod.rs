use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheSettings,
    pub database: DatabaseConfig,
    pub worker: WorkerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Pre-provisioned bearer token; otherwise log in through `/app/login`.
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    pub prefix: String,
    pub version: String,
    /// Origin serving the application shell.
    pub app_origin: Url,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local store: stories, pending queue, bookmarks.
    pub path: PathBuf,
    /// Response cache generations.
    pub cache_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub bind: String,
    pub probe_interval_secs: u64,
    pub background_sync: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl WorkerConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}

impl Config {
    /// Read the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; every key has a default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let app_origin = var("APP_ORIGIN", "http://localhost:9000");
        let log_format = var("LOG_FORMAT", "pretty");
        let probe_interval_secs: u64 = var("CONNECTIVITY_PROBE_SECS", "10")
            .parse()
            .context("CONNECTIVITY_PROBE_SECS must be a number of seconds")?;
        anyhow::ensure!(
            probe_interval_secs > 0,
            "CONNECTIVITY_PROBE_SECS must be at least 1"
        );

        Ok(Config {
            api: ApiConfig {
                base_url: var("STORY_API_BASE_URL", story_gateway::DEFAULT_BASE_URL),
                timeout_secs: var("STORY_API_TIMEOUT_SECS", "15")
                    .parse()
                    .context("STORY_API_TIMEOUT_SECS must be a number of seconds")?,
                token: lookup("STORY_API_TOKEN").filter(|token| !token.is_empty()),
            },
            cache: CacheSettings {
                prefix: var("CACHE_PREFIX", "story-app"),
                version: var("CACHE_VERSION", "v1"),
                app_origin: Url::parse(&app_origin)
                    .with_context(|| format!("APP_ORIGIN is not a valid URL: {app_origin}"))?,
            },
            database: DatabaseConfig {
                path: PathBuf::from(var("DATABASE_PATH", "story-app.db")),
                cache_path: PathBuf::from(var("CACHE_DATABASE_PATH", "story-app-cache.db")),
            },
            worker: WorkerConfig {
                bind: var("WORKER_BIND", "127.0.0.1:8787"),
                probe_interval_secs,
                background_sync: var("BACKGROUND_SYNC", "true")
                    .parse()
                    .context("BACKGROUND_SYNC must be true or false")?,
            },
            log: LogConfig {
                level: var("LOG_LEVEL", "info"),
                format: match log_format.to_ascii_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    other => anyhow::bail!("LOG_FORMAT must be json or pretty, got {other}"),
                },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.api.base_url, "https://story-api.dicoding.dev/v1");
        assert_eq!(config.api.timeout(), Duration::from_secs(15));
        assert!(config.api.token.is_none());
        assert_eq!(config.cache.prefix, "story-app");
        assert_eq!(config.cache.version, "v1");
        assert_eq!(config.cache.app_origin.as_str(), "http://localhost:9000/");
        assert_eq!(config.database.path, PathBuf::from("story-app.db"));
        assert_eq!(config.database.cache_path, PathBuf::from("story-app-cache.db"));
        assert_eq!(config.worker.bind, "127.0.0.1:8787");
        assert_eq!(config.worker.probe_interval(), Duration::from_secs(10));
        assert!(config.worker.background_sync);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("CACHE_VERSION", "v7"),
            ("BACKGROUND_SYNC", "false"),
            ("LOG_FORMAT", "JSON"),
            ("STORY_API_TOKEN", "abc"),
        ])
        .unwrap();
        assert_eq!(config.cache.version, "v7");
        assert!(!config.worker.background_sync);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.api.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config(&[("STORY_API_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config(&[("APP_ORIGIN", "not a url")]).is_err());
        assert!(config(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_zero_probe_interval_rejected() {
        let err = config(&[("CONNECTIVITY_PROBE_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("CONNECTIVITY_PROBE_SECS"));
        assert!(config(&[("CONNECTIVITY_PROBE_SECS", "1")]).is_ok());
    }

    #[test]
    fn test_empty_token_is_unset() {
        let config = config(&[("STORY_API_TOKEN", "")]).unwrap();
        assert!(config.api.token.is_none());
    }
}
