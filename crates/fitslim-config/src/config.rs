// crates/fitslim-config/src/config.rs
// ============================================================================
// Module: FitSlim Configuration
// Description: Configuration loading and validation for the Slim server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: fitslim-wire, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional; an empty file yields a loopback TCP server with
//! stderr audit logging and no exclusions. Invalid values fail closed.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use fitslim_wire::DEFAULT_PROTOCOL_VERSION;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::exclusions::FileExclusions;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "fitslim.toml";
/// Environment variable consulted when no path is specified.
pub const CONFIG_ENV_VAR: &str = "FITSLIM_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of one path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Largest accepted `server.max_message_bytes`.
pub(crate) const MAX_MESSAGE_BYTES_LIMIT: usize = 256 * 1024 * 1024;
/// Maximum length of the announced protocol version.
pub(crate) const MAX_PROTOCOL_VERSION_LENGTH: usize = 16;
/// Maximum number of exclusion patterns.
pub(crate) const MAX_EXCLUSION_PATTERNS: usize = 256;
/// Maximum length of one exclusion pattern.
pub(crate) const MAX_EXCLUSION_PATTERN_LENGTH: usize = 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// FitSlim server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FitSlimConfig {
    /// Server transport configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Test file exclusion configuration.
    #[serde(default)]
    pub exclusions: ExclusionsConfig,
}

impl FitSlimConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, source) = resolve_path(path);
        check_path_limits(source.label(), &resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "config file exceeds size limit ({} bytes, limit is {MAX_CONFIG_FILE_SIZE})",
                bytes.len()
            )));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.audit.validate()?;
        self.exclusions.validate()?;
        Ok(())
    }

    /// Compiles the configured exclusion patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a pattern does not compile.
    pub fn file_exclusions(&self) -> Result<FileExclusions, ConfigError> {
        FileExclusions::new(&self.exclusions.patterns)
    }
}

/// Server transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Transport used to accept Slim connections.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind address for the TCP transport.
    #[serde(default = "default_bind")]
    pub bind: Option<String>,
    /// Allow binding to non-loopback addresses (explicit opt-in).
    #[serde(default)]
    pub allow_non_loopback: bool,
    /// Maximum accepted message payload in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// Protocol version announced in the greeting.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Tcp,
            bind: default_bind(),
            allow_non_loopback: false,
            max_message_bytes: default_max_message_bytes(),
            protocol_version: default_protocol_version(),
        }
    }
}

impl ServerConfig {
    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_message_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_message_bytes > MAX_MESSAGE_BYTES_LIMIT {
            return Err(ConfigError::Invalid(
                "server.max_message_bytes exceeds limit".to_string(),
            ));
        }
        validate_protocol_version(&self.protocol_version)?;
        match self.transport {
            ServerTransport::Tcp => {
                let addr = self.bind_addr()?;
                if !addr.ip().is_loopback() && !self.allow_non_loopback {
                    return Err(ConfigError::Invalid(
                        "non-loopback bind requires server.allow_non_loopback".to_string(),
                    ));
                }
            }
            ServerTransport::Stdio => {}
        }
        Ok(())
    }

    /// Parses the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address is missing or invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bind = self.bind.as_deref().unwrap_or_default().trim();
        if bind.is_empty() {
            return Err(ConfigError::Invalid("tcp transport requires bind address".to_string()));
        }
        bind.parse().map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }
}

/// Supported Slim transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// Accept TCP connections, one session each.
    #[default]
    Tcp,
    /// Serve a single session over stdin/stdout.
    Stdio,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Destination for audit events.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path (JSON lines), required for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_audit_path(path)?;
        }
        if self.sink == AuditSinkKind::File && self.path.is_none() {
            return Err(ConfigError::Invalid("audit.sink=file requires audit.path".to_string()));
        }
        Ok(())
    }
}

/// Audit event destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
    /// Discard audit events.
    None,
}

/// Test file exclusion configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExclusionsConfig {
    /// Ordered regular expressions matched against file names.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl ExclusionsConfig {
    /// Validates exclusion limits and pattern syntax.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.patterns.len() > MAX_EXCLUSION_PATTERNS {
            return Err(ConfigError::Invalid("exclusions.patterns exceeds max entries".to_string()));
        }
        for pattern in &self.patterns {
            if pattern.is_empty() {
                return Err(ConfigError::Invalid(
                    "exclusions.patterns entries must be non-empty".to_string(),
                ));
            }
            if pattern.len() > MAX_EXCLUSION_PATTERN_LENGTH {
                return Err(ConfigError::Invalid(
                    "exclusions.patterns entry exceeds max length".to_string(),
                ));
            }
        }
        FileExclusions::new(&self.patterns).map(|_| ())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Where the configuration path was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSource {
    /// `--config` on the command line.
    Flag,
    /// The `FITSLIM_CONFIG` environment variable.
    Env,
    /// `fitslim.toml` in the working directory.
    Default,
}

impl ConfigSource {
    /// Label used when a path from this source is rejected.
    const fn label(self) -> &'static str {
        match self {
            Self::Flag => "--config",
            Self::Env => CONFIG_ENV_VAR,
            Self::Default => DEFAULT_CONFIG_NAME,
        }
    }
}

/// Picks the config path: the flag, then a non-blank env var, then the default.
fn resolve_path(path: Option<&Path>) -> (PathBuf, ConfigSource) {
    if let Some(path) = path {
        return (path.to_path_buf(), ConfigSource::Flag);
    }
    match env::var_os(CONFIG_ENV_VAR) {
        Some(value) if !value.to_string_lossy().trim().is_empty() => {
            (PathBuf::from(value), ConfigSource::Env)
        }
        _ => (PathBuf::from(DEFAULT_CONFIG_NAME), ConfigSource::Default),
    }
}

/// Rejects paths the server will not open: too long overall or per component.
fn check_path_limits(label: &str, path: &Path) -> Result<(), ConfigError> {
    let total = path.as_os_str().len();
    if total > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{label} path is {total} bytes, limit is {MAX_TOTAL_PATH_LENGTH}"
        )));
    }
    let longest = path.components().map(|component| component.as_os_str().len()).max();
    if let Some(length) = longest.filter(|length| *length > MAX_PATH_COMPONENT_LENGTH) {
        return Err(ConfigError::Invalid(format!(
            "{label} has a {length}-byte path component, limit is {MAX_PATH_COMPONENT_LENGTH}"
        )));
    }
    Ok(())
}

/// Checks the audit log location; blank strings are rejected.
fn validate_audit_path(value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid("audit.path must be non-empty".to_string()));
    }
    check_path_limits("audit.path", Path::new(trimmed))
}

/// Validates the greeting version: short, printable, no whitespace.
fn validate_protocol_version(version: &str) -> Result<(), ConfigError> {
    if version.is_empty() || version.len() > MAX_PROTOCOL_VERSION_LENGTH {
        return Err(ConfigError::Invalid(
            "server.protocol_version must be 1-16 characters".to_string(),
        ));
    }
    if !version.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '.') {
        return Err(ConfigError::Invalid(
            "server.protocol_version must contain only letters, digits and dots".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default TCP bind address.
#[allow(
    clippy::unnecessary_wraps,
    reason = "Serde default functions must match the Option field type."
)]
fn default_bind() -> Option<String> {
    Some("127.0.0.1:8085".to_string())
}

/// Default maximum message size.
const fn default_max_message_bytes() -> usize {
    1024 * 1024
}

/// Default greeting protocol version.
fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}
