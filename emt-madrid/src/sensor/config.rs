//! Sensor platform configuration.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::StopId;
use crate::emt::EmtConfig;

/// Icon used when none is configured.
pub const DEFAULT_ICON: &str = "mdi:bus";

/// Errors while loading or validating a [`PlatformConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    /// Required environment variable is unset
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A value is present but unusable
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Configuration for one monitored stop.
///
/// Mirrors the sensor platform block of the host configuration:
///
/// ```json
/// {"email": "me@example.com", "password": "...", "stop": 72, "lines": ["27"]}
/// ```
#[derive(Clone, Deserialize)]
pub struct PlatformConfig {
    /// MobilityLabs account email.
    pub email: String,

    /// MobilityLabs account password.
    pub password: String,

    /// Stop to monitor.
    pub stop: StopId,

    /// Lines to create sensors for. Empty means every line at the stop.
    #[serde(default)]
    pub lines: Vec<String>,

    /// Icon reported by every sensor.
    #[serde(default = "default_icon")]
    pub icon: String,

    /// Seconds between two polls of the arrivals endpoint.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Address the state endpoint listens on.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// API base URL override.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout override, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

fn default_scan_interval_secs() -> u64 {
    60
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

impl PlatformConfig {
    /// Create a config with defaults for everything but the required fields.
    pub fn new(email: impl Into<String>, password: impl Into<String>, stop: StopId) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            stop,
            lines: Vec::new(),
            icon: default_icon(),
            scan_interval_secs: default_scan_interval_secs(),
            listen: default_listen(),
            base_url: None,
            timeout_secs: None,
        }
    }

    /// Restrict sensors to the given lines.
    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Load a config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load a config from the process environment.
    ///
    /// `EMT_CONFIG` names a JSON file; when unset the individual
    /// `EMT_EMAIL`, `EMT_PASSWORD`, `EMT_STOP`, `EMT_LINES`, `EMT_ICON`,
    /// `EMT_SCAN_INTERVAL` and `EMT_LISTEN` variables are read instead.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(path) = lookup("EMT_CONFIG") {
            return Self::from_file(path);
        }

        let email = lookup("EMT_EMAIL").ok_or(ConfigError::Missing("EMT_EMAIL"))?;
        let password = lookup("EMT_PASSWORD").ok_or(ConfigError::Missing("EMT_PASSWORD"))?;
        let stop = lookup("EMT_STOP").ok_or(ConfigError::Missing("EMT_STOP"))?;
        let stop = StopId::parse(&stop).map_err(|e| ConfigError::Invalid {
            key: "EMT_STOP",
            reason: e.to_string(),
        })?;

        let mut config = Self::new(email, password, stop);

        if let Some(lines) = lookup("EMT_LINES") {
            config.lines = lines
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(icon) = lookup("EMT_ICON") {
            config.icon = icon;
        }
        if let Some(secs) = lookup("EMT_SCAN_INTERVAL") {
            config.scan_interval_secs = secs.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "EMT_SCAN_INTERVAL",
                reason: format!("not a number of seconds: {secs}"),
            })?;
        }
        if let Some(listen) = lookup("EMT_LISTEN") {
            config.listen = listen.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "EMT_LISTEN",
                reason: format!("not a socket address: {listen}"),
            })?;
        }
        if let Some(url) = lookup("EMT_BASE_URL") {
            config.base_url = Some(url);
        }

        Ok(config)
    }

    /// Check values that deserialization cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.email.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "email",
                reason: "must not be empty".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(ConfigError::Invalid {
                key: "password",
                reason: "must not be empty".to_string(),
            });
        }
        if self.scan_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "scan_interval_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Poll interval as a `Duration`.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    /// Client configuration derived from this platform config.
    pub fn emt_config(&self) -> EmtConfig {
        let mut config = EmtConfig::new(&self.email, &self.password);
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(secs);
        }
        config
    }
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("stop", &self.stop)
            .field("lines", &self.lines)
            .field("icon", &self.icon)
            .field("scan_interval_secs", &self.scan_interval_secs)
            .field("listen", &self.listen)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
