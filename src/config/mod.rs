use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::debug;

use crate::session::{CredentialSource, MemoryCredential, TokenFile};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the ReadSum backend
    pub base_url: String,

    /// API token. Takes precedence over `token_file` when set.
    pub token: Option<String>,

    /// File holding the API token; re-read on every request
    pub token_file: PathBuf,

    /// Request timeout
    pub timeout_seconds: u64,
}

/// Values read from a configuration file; anything left out keeps its
/// current value
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub token_file: Option<PathBuf>,
    pub timeout_seconds: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            token_file: default_token_file(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

fn default_token_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("readsum").join("token"))
        .unwrap_or_else(|| PathBuf::from("./.readsum-token"))
}

impl Config {
    /// Initialize configuration from various sources
    pub async fn init() -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = Self::default();

        // Configuration files first, environment variables win
        if let Some(file_config) = Self::load_from_file().await? {
            config.merge_with(file_config);
        }
        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply `READSUM_*` overrides using `lookup` to read variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("READSUM_BASE_URL") {
            self.base_url = base_url;
        }

        if let Some(token) = lookup("READSUM_TOKEN") {
            self.token = Some(token);
        }

        if let Some(path) = lookup("READSUM_TOKEN_FILE") {
            self.token_file = PathBuf::from(path);
        }

        if let Some(timeout) = lookup("READSUM_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(seconds) => self.timeout_seconds = seconds,
                Err(_) => debug!("Ignoring invalid READSUM_TIMEOUT_SECONDS: {}", timeout),
            }
        }
    }

    /// Load the first configuration file found
    pub async fn load_from_file() -> Result<Option<ConfigFile>> {
        // Configuration priority:
        // 1. ./.readsum.json
        // 2. ./readsum.json
        // 3. $CONFIG_DIR/readsum/readsum.json
        let mut config_paths = vec![
            PathBuf::from("./.readsum.json"),
            PathBuf::from("./readsum.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("readsum").join("readsum.json"));
        }

        for path in config_paths {
            if path.exists() {
                return Self::load_from_path(&path).await.map(Some);
            }
        }

        Ok(None)
    }

    pub async fn load_from_path(path: &Path) -> Result<ConfigFile> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Merge values from a configuration file into this one
    pub fn merge_with(&mut self, other: ConfigFile) {
        if let Some(base_url) = other.base_url {
            self.base_url = base_url;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
        if let Some(token_file) = other.token_file {
            self.token_file = token_file;
        }
        if let Some(timeout_seconds) = other.timeout_seconds {
            self.timeout_seconds = timeout_seconds;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// The credential source selected by this configuration
    pub fn credentials(&self) -> Arc<dyn CredentialSource> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Arc::new(MemoryCredential::new(token)),
            _ => Arc::new(TokenFile::new(&self.token_file)),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL: {}", self.base_url))?;

        if self.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("timeout_seconds must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(config.token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("READSUM_BASE_URL", "https://api.example.com"),
            ("READSUM_TOKEN", "abc"),
            ("READSUM_TIMEOUT_SECONDS", "5"),
        ]));

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_timeout_env_is_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[("READSUM_TIMEOUT_SECONDS", "soon")]));
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[tokio::test]
    async fn test_file_merge_keeps_unset_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readsum.json");
        std::fs::write(&path, r#"{"base_url": "http://10.0.0.2:8080"}"#).unwrap();

        let mut config = Config::default();
        config.merge_with(Config::load_from_path(&path).await.unwrap());

        assert_eq!(config.base_url, "http://10.0.0.2:8080");
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert!(config.token.is_none());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readsum.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from_path(&path).await.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.base_url = "localhost without scheme".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_prefer_configured_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.token_file = dir.path().join("token");

        assert!(!config.credentials().is_present());

        config.token = Some("abc".to_string());
        assert!(config.credentials().is_present());

        config.token = Some("  ".to_string());
        std::fs::write(&config.token_file, "from-file").unwrap();
        assert_eq!(config.credentials().token().as_deref(), Some("from-file"));
    }
}
