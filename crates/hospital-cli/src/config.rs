//! Configuration for the hospital CLI.
//!
//! Provides the [`HospitalConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `HOSPITAL_CONFIG` environment variable
//! 3. XDG default: `~/.config/hospital/config.toml`
//! 4. Built-in defaults
//!
//! `HOSPITAL_*` variables (e.g. `HOSPITAL_API_BASE_URL`) override file values.

use confyg::{Confygery, env};
use hospital_core::{Error, ROLE_USER, ResolutionFallback, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the hospital CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalConfig {
    /// Application name, used in alert headers and page title keys.
    pub app_name: String,

    /// Backend connection settings.
    pub api: ApiConfig,

    /// Retry policy for reads.
    pub retry: RetryConfig,

    /// Route access and fallback settings.
    pub routes: RoutesConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend root URL.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Bearer token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Retry policy for reads. Saves and deletes are never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts including the first one.
    pub max_attempts: u32,

    /// First backoff delay in milliseconds.
    pub initial_delay_ms: u64,

    /// Backoff ceiling in milliseconds.
    pub max_delay_ms: u64,
}

/// Route access and fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Authorities held by the CLI user.
    pub authorities: Vec<String>,

    /// Where to go when a hospital cannot be resolved.
    pub fallback: ResolutionFallback,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for HospitalConfig {
    fn default() -> Self {
        Self {
            app_name: "amachouApp".to_string(),
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
            routes: RoutesConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            token: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            authorities: vec![ROLE_USER.to_string()],
            fallback: ResolutionFallback::default(),
        }
    }
}

impl ApiConfig {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetryConfig {
    /// First backoff delay.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Backoff ceiling.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl HospitalConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("HOSPITAL");
        env_opts.add_section("api");
        env_opts.add_section("retry");
        env_opts.add_section("routes");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("HOSPITAL_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("hospital").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `HOSPITAL_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "HOSPITAL", &mut vars);
        Ok(vars)
    }
}

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
