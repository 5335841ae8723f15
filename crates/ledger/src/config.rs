//! `key=value` configuration for the ledger and its logger.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use evrd_log::{Format, Level, LogConfig};

pub const DEFAULT_ASSET_CACHE_ENTRIES: usize = 50_000;
pub const DEFAULT_VERIFIER_CACHE_ENTRIES: usize = 10_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LedgerConfig {
    pub asset_cache_entries: usize,
    pub verifier_cache_entries: usize,
    pub log: LogConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            asset_cache_entries: DEFAULT_ASSET_CACHE_ENTRIES,
            verifier_cache_entries: DEFAULT_VERIFIER_CACHE_ENTRIES,
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    InvalidValue {
        path: PathBuf,
        key: String,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "failed to read {}: {message}", path.display())
            }
            ConfigError::InvalidValue { path, key, value } => {
                write!(f, "invalid {key} '{value}' in {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reads `path` into a [`LedgerConfig`]. A missing file yields the defaults.
/// When a key repeats, the last value wins.
pub fn load_ledger_config(path: &Path) -> Result<LedgerConfig, ConfigError> {
    let mut config = LedgerConfig::default();
    let Some(conf) = load_conf(path)? else {
        return Ok(config);
    };

    let invalid = |key: &str, value: &str| ConfigError::InvalidValue {
        path: path.to_path_buf(),
        key: key.to_string(),
        value: value.to_string(),
    };
    let last = |key: &str| conf.get(key).and_then(|values| values.last());

    if let Some(value) = last("assetcache") {
        config.asset_cache_entries = value
            .parse::<usize>()
            .map_err(|_| invalid("assetcache", value))?;
    }
    if let Some(value) = last("verifiercache") {
        config.verifier_cache_entries = value
            .parse::<usize>()
            .map_err(|_| invalid("verifiercache", value))?;
    }
    if let Some(value) = last("loglevel") {
        config.log.level = Level::parse(value).ok_or_else(|| invalid("loglevel", value))?;
    }
    if let Some(value) = last("logformat") {
        config.log.format = Format::parse(value).ok_or_else(|| invalid("logformat", value))?;
    }
    if let Some(value) = last("logtimestamps") {
        config.log.timestamps =
            parse_conf_bool(value).ok_or_else(|| invalid("logtimestamps", value))?;
    }
    Ok(config)
}

fn load_conf(path: &Path) -> Result<Option<HashMap<String, Vec<String>>>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            })
        }
    };

    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    for raw_line in contents.lines() {
        let mut line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(idx) = line.find('#') {
            line = &line[..idx];
        }
        if let Some(idx) = line.find(';') {
            line = &line[..idx];
        }
        line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line, "1"),
        };
        if key.is_empty() {
            continue;
        }
        out.entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
    }
    Ok(Some(out))
}

fn parse_conf_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Some(true);
    }
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
