//! Gateway configuration
//!
//! Built once at startup from defaults, an optional YAML file and `MC_*`
//! environment variables, then shared read-only by every tool call.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::tools::encoding::Encoding;

pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

pub const ENV_ALLOWED_ROOTS: &str = "MC_ALLOWED_ROOTS";
pub const ENV_MAX_READ_BYTES: &str = "MC_MAX_READ_BYTES";
pub const ENV_MAX_WRITE_BYTES: &str = "MC_MAX_WRITE_BYTES";
pub const ENV_DEFAULT_ENCODING: &str = "MC_DEFAULT_ENCODING";
pub const ENV_CHUNK_SIZE: &str = "MC_CHUNK_SIZE";
pub const ENV_TIMEOUT_MS: &str = "MC_TOOL_TIMEOUT_MS";

/// Immutable settings for the file tool gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Directories tool paths must resolve into. Relative tool paths are
    /// joined onto the first one.
    pub allowed_roots: Vec<PathBuf>,
    pub max_read_bytes: u64,
    pub max_write_bytes: u64,
    pub default_encoding: Encoding,
    /// Piece size for chunked reads and staged writes
    pub chunk_size: usize,
    /// Overall per-call timeout, if any
    pub timeout_ms: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            allowed_roots: vec![cwd],
            max_read_bytes: DEFAULT_MAX_BYTES,
            max_write_bytes: DEFAULT_MAX_BYTES,
            default_encoding: Encoding::Utf8,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout_ms: None,
        }
    }
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env(|var| std::env::var(var).ok())
    }

    /// Load a YAML config file; missing keys keep their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MC_*` overrides using the given variable lookup
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(roots) = non_empty(lookup(ENV_ALLOWED_ROOTS)) {
            self.allowed_roots = std::env::split_paths(&roots)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        if let Some(value) = non_empty(lookup(ENV_MAX_READ_BYTES)) {
            self.max_read_bytes = parse_number(ENV_MAX_READ_BYTES, &value)?;
        }
        if let Some(value) = non_empty(lookup(ENV_MAX_WRITE_BYTES)) {
            self.max_write_bytes = parse_number(ENV_MAX_WRITE_BYTES, &value)?;
        }
        if let Some(value) = non_empty(lookup(ENV_DEFAULT_ENCODING)) {
            self.default_encoding = value.parse()?;
        }
        if let Some(value) = non_empty(lookup(ENV_CHUNK_SIZE)) {
            self.chunk_size = parse_number(ENV_CHUNK_SIZE, &value)?;
        }
        if let Some(value) = non_empty(lookup(ENV_TIMEOUT_MS)) {
            self.timeout_ms = Some(parse_number(ENV_TIMEOUT_MS, &value)?);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.allowed_roots = roots.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_root(self, root: impl Into<PathBuf>) -> Self {
        self.with_roots([root.into()])
    }

    pub fn with_max_read_bytes(mut self, max: u64) -> Self {
        self.max_read_bytes = max;
        self
    }

    pub fn with_max_write_bytes(mut self, max: u64) -> Self {
        self.max_write_bytes = max;
        self
    }

    pub fn with_default_encoding(mut self, encoding: Encoding) -> Self {
        self.default_encoding = encoding;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Sanity checks that do not touch the filesystem
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidLimit("chunk_size must be > 0".to_string()));
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::InvalidLimit("timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }

    /// Get configuration summary for display
    pub fn get_summary(&self) -> Vec<String> {
        let roots: Vec<String> = self
            .allowed_roots
            .iter()
            .map(|r| r.display().to_string())
            .collect();
        vec![
            format!("Allowed roots: {}", roots.join(", ")),
            format!("Max read bytes: {}", self.max_read_bytes),
            format!("Max write bytes: {}", self.max_write_bytes),
            format!("Default encoding: {}", self.default_encoding),
            format!("Chunk size: {}", self.chunk_size),
            format!(
                "Timeout: {}",
                self.timeout_ms
                    .map(|ms| format!("{}ms", ms))
                    .unwrap_or_else(|| "none".to_string())
            ),
        ]
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        var: var.to_string(),
        message: format!("'{}': {}", value, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.allowed_roots.len(), 1);
        assert_eq!(config.max_read_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_write_bytes, 10 * 1024 * 1024);
        assert_eq!(config.default_encoding, Encoding::Utf8);
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let roots = std::env::join_paths(["/srv/a", "/srv/b"]).unwrap();
        let roots = roots.to_string_lossy().to_string();
        let config = GatewayConfig::default()
            .apply_env(lookup(&[
                (ENV_ALLOWED_ROOTS, roots.as_str()),
                (ENV_MAX_READ_BYTES, "1024"),
                (ENV_MAX_WRITE_BYTES, " 2048 "),
                (ENV_DEFAULT_ENCODING, "latin1"),
                (ENV_TIMEOUT_MS, "500"),
            ]))
            .unwrap();

        assert_eq!(
            config.allowed_roots,
            vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")]
        );
        assert_eq!(config.max_read_bytes, 1024);
        assert_eq!(config.max_write_bytes, 2048);
        assert_eq!(config.default_encoding, Encoding::Latin1);
        assert_eq!(config.timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_env_empty_values_ignored() {
        let config = GatewayConfig::default()
            .apply_env(lookup(&[(ENV_MAX_READ_BYTES, "  ")]))
            .unwrap();
        assert_eq!(config.max_read_bytes, DEFAULT_MAX_BYTES);
    }

    #[test]
    fn test_env_invalid_values() {
        let err = GatewayConfig::default()
            .apply_env(lookup(&[(ENV_MAX_READ_BYTES, "ten")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref var, .. } if var == ENV_MAX_READ_BYTES));

        let err = GatewayConfig::default()
            .apply_env(lookup(&[(ENV_DEFAULT_ENCODING, "utf-16")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEncoding(_)));

        let err = GatewayConfig::default()
            .apply_env(lookup(&[(ENV_CHUNK_SIZE, "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLimit(_)));
    }

    #[test]
    fn test_yaml_config() {
        let config = GatewayConfig::from_yaml_str(
            "allowed_roots: [/data]\nmax_read_bytes: 64\ndefault_encoding: ascii\n",
        )
        .unwrap();
        assert_eq!(config.allowed_roots, vec![PathBuf::from("/data")]);
        assert_eq!(config.max_read_bytes, 64);
        assert_eq!(config.max_write_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(config.default_encoding, Encoding::Ascii);

        assert!(GatewayConfig::from_yaml_str("allowed_roots: []\n").is_err());
        assert!(GatewayConfig::from_yaml_str("unknown_key: 1\n").is_err());
    }

    #[test]
    fn test_builder() {
        let config = GatewayConfig::new()
            .with_root("/tmp/sandbox")
            .with_max_read_bytes(5)
            .with_max_write_bytes(6)
            .with_chunk_size(2)
            .with_timeout_ms(Some(100));
        assert_eq!(config.allowed_roots, vec![PathBuf::from("/tmp/sandbox")]);
        assert_eq!(config.max_read_bytes, 5);
        assert_eq!(config.max_write_bytes, 6);
        assert_eq!(config.chunk_size, 2);
        assert_eq!(config.timeout_ms, Some(100));
        assert_eq!(config.get_summary().len(), 6);
    }
}
