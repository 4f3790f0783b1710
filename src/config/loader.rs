//! Configuration loading.
//!
//! Precedence, lowest first: built-in defaults, TOML file, `API_*` environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::{Table, Value};

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix of environment overrides. `API_HTTP__PORT=9090` sets `http.port`.
pub const ENV_PREFIX: &str = "API_";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, merge and validate configuration.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config = load_with_env(path, std::env::vars())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Merge defaults, the optional file and the given environment. No validation.
pub fn load_with_env<I>(path: Option<&Path>, env: I) -> Result<AppConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut merged = match Value::try_from(AppConfig::default())? {
        Value::Table(table) => table,
        _ => Table::new(),
    };

    if let Some(path) = path {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: Table = toml::from_str(&content)?;
        merge(&mut merged, file);
    }

    merge(&mut merged, env_overrides(env));

    Ok(Value::Table(merged).try_into()?)
}

/// Build a nested table from `API_*` variables.
fn env_overrides<I>(env: I) -> Table
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut table = Table::new();

    for (key, raw) in env {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = stripped
            .to_lowercase()
            .split("__")
            .map(str::to_string)
            .collect();
        if path.iter().any(String::is_empty) {
            continue;
        }
        insert_path(&mut table, &path, parse_scalar(&raw));
    }

    table
}

fn insert_path(table: &mut Table, path: &[String], value: Value) {
    match path {
        [] => {}
        [leaf] => {
            table.insert(leaf.clone(), value);
        }
        [head, rest @ ..] => {
            let entry = table
                .entry(head.clone())
                .or_insert_with(|| Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            if let Value::Table(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

/// Environment values are typed by their TOML reading; anything else is a string.
fn parse_scalar(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    Value::String(raw.to_string())
}

/// Deep-merge `overlay` into `base`; overlay scalars win.
fn merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => merge(existing, incoming),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
