//! Configuration snapshot and config file handling

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::CourierError;
use crate::http::ProtocolVersion;
use crate::message::InternalRequest;

/// Default timeout for a single transport call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default redirect budget
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Default number of in-flight requests for batch sends
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Default User-Agent header
pub const DEFAULT_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// Default multipart boundary
pub const DEFAULT_BOUNDARY: &str = "courier-form-boundary-7MA4YWxkTrZu0gW";

/// How structured form data is encoded on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingType {
    #[default]
    UrlEncoded,
    Multipart,
}

impl EncodingType {
    /// Content-Type value for this encoding
    pub fn content_type(&self, boundary: &str) -> String {
        match self {
            EncodingType::UrlEncoded => "application/x-www-form-urlencoded".to_string(),
            EncodingType::Multipart => format!("multipart/form-data; boundary={}", boundary),
        }
    }
}

impl FromStr for EncodingType {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urlencoded" | "url-encoded" | "application/x-www-form-urlencoded" => Ok(EncodingType::UrlEncoded),
            "multipart" | "multipart/form-data" => Ok(EncodingType::Multipart),
            other => Err(CourierError::Config(format!("Unknown encoding type: {}", other))),
        }
    }
}

/// Read-only configuration snapshot handed to the pipeline and transports
///
/// Changing a value produces a new snapshot through the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    timeout: Duration,
    max_redirects: u32,
    protocol_version: ProtocolVersion,
    user_agent: String,
    encoding_type: EncodingType,
    boundary: String,
    concurrency: usize,
    keep_alive: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            protocol_version: ProtocolVersion::Http11,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            encoding_type: EncodingType::UrlEncoded,
            boundary: DEFAULT_BOUNDARY.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            keep_alive: false,
        }
    }
}

/// On-disk layout: everything lives under an `[http]` table
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    http: HttpSection,
}

#[derive(Debug, Default, Deserialize)]
struct HttpSection {
    timeout: Option<f64>,
    max_redirects: Option<u32>,
    protocol_version: Option<String>,
    user_agent: Option<String>,
    encoding_type: Option<String>,
    boundary: Option<String>,
    concurrency: Option<usize>,
    keep_alive: Option<bool>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> Result<Self, CourierError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CourierError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_toml_str(&content)
    }

    /// Load from the default config file location
    pub fn load_default() -> Result<Self, CourierError> {
        Self::load(&Self::default_config_file())
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, CourierError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| CourierError::Config(format!("Invalid config TOML: {}", e)))?;
        let section = file.http;

        let mut config = Self::default();

        if let Some(timeout) = section.timeout {
            config = config.with_timeout_secs(timeout)?;
        }
        if let Some(max_redirects) = section.max_redirects {
            config = config.with_max_redirects(max_redirects);
        }
        if let Some(version) = section.protocol_version {
            let version = version
                .parse()
                .map_err(|e: CourierError| CourierError::Config(e.to_string()))?;
            config = config.with_protocol_version(version);
        }
        if let Some(user_agent) = section.user_agent {
            config = config.with_user_agent(user_agent);
        }
        if let Some(encoding) = section.encoding_type {
            config = config.with_encoding_type(encoding.parse()?);
        }
        if let Some(boundary) = section.boundary {
            config = config.with_boundary(boundary);
        }
        if let Some(concurrency) = section.concurrency {
            if concurrency == 0 {
                return Err(CourierError::Config("concurrency must be at least 1".to_string()));
            }
            config = config.with_concurrency(concurrency);
        }
        if let Some(keep_alive) = section.keep_alive {
            config = config.with_keep_alive(keep_alive);
        }

        Ok(config)
    }

    /// Get the default config directory
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("courier"))
            .unwrap_or_else(|| PathBuf::from(".courier"))
    }

    pub fn default_config_file() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// Whether redirects are followed at all
    pub fn has_max_redirects(&self) -> bool {
        self.max_redirects > 0
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn encoding_type(&self) -> EncodingType {
        self.encoding_type
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Encoding actually used for `request`: file uploads force multipart
    pub fn effective_encoding(&self, request: &InternalRequest) -> EncodingType {
        if request.has_files() {
            EncodingType::Multipart
        } else {
            self.encoding_type
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout from fractional seconds
    pub fn with_timeout_secs(self, seconds: f64) -> Result<Self, CourierError> {
        let timeout = Duration::try_from_secs_f64(seconds)
            .map_err(|_| CourierError::Config(format!("Invalid timeout: {}", seconds)))?;
        Ok(self.with_timeout(timeout))
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_encoding_type(mut self, encoding_type: EncodingType) -> Self {
        self.encoding_type = encoding_type;
        self
    }

    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}
