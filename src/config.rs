//! Inspector and connection configuration parsed from environment variables.

pub const DEFAULT_DRAWER_WIDTH: f64 = 650.0;
pub const DEFAULT_DRAWER_MIN_WIDTH: f64 = 500.0;
pub const DEFAULT_DRAWER_MAX_WIDTH: f64 = 1500.0;
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while building configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("drawer min width {min} exceeds max width {max}")]
    InvertedBounds { min: f64, max: f64 },
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InspectorConfig {
    pub drawer_width: f64,
    pub drawer_min_width: f64,
    pub drawer_max_width: f64,
    /// Serialize record bodies over multiple lines.
    pub pretty_body: bool,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            drawer_width: DEFAULT_DRAWER_WIDTH,
            drawer_min_width: DEFAULT_DRAWER_MIN_WIDTH,
            drawer_max_width: DEFAULT_DRAWER_MAX_WIDTH,
            pretty_body: false,
        }
    }
}

impl InspectorConfig {
    /// Build inspector config from environment variables.
    ///
    /// Optional:
    /// - `RECORDSCOPE_DRAWER_WIDTH`: default 650
    /// - `RECORDSCOPE_DRAWER_MIN_WIDTH`: default 500
    /// - `RECORDSCOPE_DRAWER_MAX_WIDTH`: default 1500
    /// - `RECORDSCOPE_PRETTY_BODY`: `true`/`1` to pretty-print bodies
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvertedBounds`] when min exceeds max and
    /// [`ConfigError::Parse`] for an unrecognised boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            drawer_width: env_parse_f64("RECORDSCOPE_DRAWER_WIDTH", DEFAULT_DRAWER_WIDTH),
            drawer_min_width: env_parse_f64("RECORDSCOPE_DRAWER_MIN_WIDTH", DEFAULT_DRAWER_MIN_WIDTH),
            drawer_max_width: env_parse_f64("RECORDSCOPE_DRAWER_MAX_WIDTH", DEFAULT_DRAWER_MAX_WIDTH),
            pretty_body: parse_bool(std::env::var("RECORDSCOPE_PRETTY_BODY").ok().as_deref())?,
        };
        config.validate()
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvertedBounds`] when min exceeds max.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.drawer_min_width > self.drawer_max_width {
            return Err(ConfigError::InvertedBounds { min: self.drawer_min_width, max: self.drawer_max_width });
        }
        Ok(self)
    }
}

/// Where and as whom the query transport connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(endpoint: &str, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            namespace: namespace.into(),
            database: database.into(),
            username: None,
            password: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }
}

fn env_parse_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn parse_bool(raw: Option<&str>) -> Result<bool, ConfigError> {
    match raw.map(str::trim) {
        None | Some("" | "0" | "false") => Ok(false),
        Some("1" | "true") => Ok(true),
        Some(other) => Err(ConfigError::Parse(format!("invalid RECORDSCOPE_PRETTY_BODY: {other}"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
