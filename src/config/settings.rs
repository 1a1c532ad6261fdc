//! Configuration settings for the keygate daemon.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::GateError;

/// Environment variable that overrides `logging.file`.
pub const LOG_FILE_ENV: &str = "LOG_FILE_LOCATION";

/// Main configuration structure for the daemon.
///
/// Every section is optional; a missing file section falls back to the
/// defaults below.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub credentials: CredentialConfig,
    #[serde(default)]
    pub resource: ResourceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// How long to wait for in-flight requests on shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
    /// Upper bound on handling a single request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Credential issuance policy.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialConfig {
    /// Lifetime of an issued credential in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Failed validations tolerated before re-issuance is required.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Secrets are drawn from `[0, secret_upper_bound)`.
    #[serde(default = "default_secret_upper_bound")]
    pub secret_upper_bound: u32,
    /// Context string the checksum is bound to.
    #[serde(default = "default_resource_context")]
    pub resource_context: String,
    /// Digest used to derive checksums and client ids.
    #[serde(default)]
    pub checksum_algorithm: ChecksumKind,
    /// Whether all issuances share one client id.
    #[serde(default)]
    pub identity_mode: IdentityMode,
}

/// Supported checksum digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumKind {
    #[default]
    Md5,
    Sha256,
}

/// How client identities are assigned to issued credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// One identity minted at startup; each issuance replaces the single record.
    #[default]
    Shared,
    /// Each issuance mints a fresh identity with its own record.
    PerIssuance,
}

/// Protected resource configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    /// Path to the users JSON file.
    #[serde(default = "default_users_path")]
    pub users_path: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Path to the audit log file.
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    10
}

fn default_ttl() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    5
}

fn default_secret_upper_bound() -> u32 {
    99_999_999
}

fn default_resource_context() -> String {
    "/users".to_string()
}

fn default_users_path() -> PathBuf {
    PathBuf::from("users.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("/var/log/keygate/audit.log")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_attempts: default_max_attempts(),
            secret_upper_bound: default_secret_upper_bound(),
            resource_context: default_resource_context(),
            checksum_algorithm: ChecksumKind::default(),
            identity_mode: IdentityMode::default(),
        }
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            users_path: default_users_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
        }
    }
}

impl ServerConfig {
    /// Parsed listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, GateError> {
        self.bind_addr.parse().map_err(|e| GateError::Config {
            message: format!("Invalid bind address '{}': {}", self.bind_addr, e),
        })
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl CredentialConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    ///
    /// Fields missing from the file take their defaults, then
    /// `LOG_FILE_LOCATION` is applied and the result validated.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file
    ///
    /// # Errors
    ///
    /// Returns `GateError::Config` if the file cannot be read, does not parse,
    /// or fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GateError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| GateError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let mut settings = Self::from_toml(&content).map_err(|e| GateError::Config {
            message: format!("Failed to parse config file '{}': {}", path.display(), e),
        })?;

        settings.apply_env();
        settings.validate()?;

        Ok(settings)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> Result<Self, GateError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GateError> {
        let mut settings = Self::default();
        settings.apply_env_with(lookup);
        settings.validate()?;
        Ok(settings)
    }

    fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides.
    fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(LOG_FILE_ENV) {
            if !path.is_empty() {
                self.logging.file = Some(PathBuf::from(path));
            }
        }
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), GateError> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(GateError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        // Validate log format
        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(GateError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        self.server.socket_addr()?;

        let creds = &self.credentials;
        if creds.max_attempts == 0 {
            return Err(GateError::Config {
                message: "credentials.max_attempts must be at least 1".to_string(),
            });
        }
        if creds.ttl_seconds == 0 {
            return Err(GateError::Config {
                message: "credentials.ttl_seconds must be at least 1".to_string(),
            });
        }
        if creds.secret_upper_bound == 0 {
            return Err(GateError::Config {
                message: "credentials.secret_upper_bound must be at least 1".to_string(),
            });
        }
        if creds.resource_context.is_empty() {
            return Err(GateError::Config {
                message: "credentials.resource_context must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
