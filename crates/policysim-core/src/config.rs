//! Client configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::preview::DEFAULT_BASELINE_GAP;

/// Default engine URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "policysim.toml";

/// Environment variable overriding the engine URL
pub const ENV_API_URL: &str = "POLICYSIM_API_URL";

/// Environment variable overriding the request timeout
pub const ENV_TIMEOUT_SECS: &str = "POLICYSIM_TIMEOUT_SECS";

/// Engine client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Engine base URL, without the `/api` prefix
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Baseline pay gap used by the local preview
    pub baseline_gap: f64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            baseline_gap: DEFAULT_BASELINE_GAP,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the preview baseline
    pub fn with_baseline_gap(mut self, gap: f64) -> Self {
        self.baseline_gap = gap;
        self
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Load from `path` (or `policysim.toml` when present), then apply
    /// environment overrides. A `.env` file is honored.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `POLICYSIM_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS.to_string(),
                reason: format!("expected whole seconds, got {raw:?}"),
            })?;
        }
        self.validate()
    }

    /// Check every value
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                reason: format!("expected an http(s) URL, got {:?}", self.base_url),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.baseline_gap.is_finite() || self.baseline_gap < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "baseline_gap".to_string(),
                reason: format!("expected a non-negative percentage, got {}", self.baseline_gap),
            });
        }
        Ok(())
    }

    /// Full URL of an engine endpoint
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.baseline_gap, 23.0);
        assert!(config.user_agent.starts_with("policysim-core/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_base_url("https://engine.example.org/")
            .with_timeout_secs(5)
            .with_baseline_gap(18.5);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.baseline_gap, 18.5);
        assert_eq!(
            config.endpoint("/api/simulate"),
            "https://engine.example.org/api/simulate"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml("timeout_secs = 10\n", "inline").unwrap();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"http://10.0.0.2:5000\"").unwrap();
        writeln!(file, "baseline_gap = 20.0").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.2:5000");
        assert_eq!(config.baseline_gap, 20.0);
    }

    #[test]
    fn test_missing_file_and_bad_toml() {
        assert!(matches!(
            ClientConfig::from_file("/nonexistent/policysim.toml"),
            Err(ConfigError::Read { .. })
        ));
        assert!(matches!(
            ClientConfig::from_toml("timeout_secs = \"soon\"", "inline"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_URL, "https://sim.example.org"),
            (ENV_TIMEOUT_SECS, " 12 "),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "https://sim.example.org");
        assert_eq!(config.timeout_secs, 12);
    }

    #[test]
    fn test_invalid_overrides() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_TIMEOUT_SECS).then(|| "fast".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_TIMEOUT_SECS));

        let mut config = ClientConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_API_URL).then(|| "localhost:5000".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "base_url"));
    }
}
