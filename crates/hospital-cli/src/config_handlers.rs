//! Handlers for `hospital config {path,get,set,init,export}`.
//!
//! Each operation returns what it would print so the dispatcher owns all
//! terminal output.

use crate::cli::ConfigAction;
use crate::config::HospitalConfig;
use hospital_core::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
///
/// Takes the raw `--config` path rather than a loaded config because `path`
/// and `init` must work before any config file exists.
pub fn handle_config_command(
    config_path: Option<&str>,
    action: ConfigAction,
    out: &mut impl Write,
) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = config_file(config_path)?;
            writeln!(out, "{}", path.display())?;
            if !path.exists() {
                eprintln!("(file does not exist; run `hospital config init` to create it)");
            }
        }
        ConfigAction::Get { key } => {
            writeln!(out, "{}", config_get(config_path, &key)?)?;
        }
        ConfigAction::Set { key, value } => {
            let path = config_set(config_path, &key, &value)?;
            writeln!(out, "Set {key} = {value} in {}", path.display())?;
        }
        ConfigAction::Init { file, force } => {
            let path = config_init(file.as_deref(), force)?;
            writeln!(out, "Config file created at {}", path.display())?;
        }
        ConfigAction::Export { docker_env } => {
            let config = HospitalConfig::load(config_path)?;
            for (key, value) in config.to_env_vars()? {
                if docker_env {
                    writeln!(out, "--env {key}={value}")?;
                } else {
                    writeln!(out, "{key}={value}")?;
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Operations
// ============================================================================

fn config_file(config_path: Option<&str>) -> Result<PathBuf> {
    HospitalConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))
}

/// Look up a dotted key in the effective configuration.
pub fn config_get(config_path: Option<&str>, key: &str) -> Result<String> {
    let config = HospitalConfig::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Write a dotted key into the config file, returning the file's path.
pub fn config_set(config_path: Option<&str>, key: &str, value: &str) -> Result<PathBuf> {
    let path = config_file(config_path)?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `hospital config init` first.",
            path.display()
        )));
    }

    let mut doc = read_toml(&path)?;
    set_nested_value(&mut doc, key, parse_value(value))?;
    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    std::fs::write(&path, toml_str)?;
    Ok(path)
}

/// Write the default configuration, returning the file's path.
pub fn config_init(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => HospitalConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, HospitalConfig::default().to_toml_string()?)?;
    Ok(path)
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

fn read_toml(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
}

fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        current = current
            .as_table_mut()
            .ok_or_else(|| Error::config(format!("Cannot navigate into '{part}'")))?
            .entry(part)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config(format!("Cannot set '{key}' on a non-table value")))?
        .insert(leaf.to_string(), value);
    Ok(())
}

/// Parse a command-line value, trying bool, integer, float, then string.
fn parse_value(s: &str) -> toml::Value {
    if let Ok(b) = s.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(s.to_string())
}

fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
