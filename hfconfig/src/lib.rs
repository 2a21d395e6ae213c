//! # HypeFeed Configuration Module
//!
//! This module provides configuration management for HypeFeed, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use hfconfig::get_config;
//!
//! // Get the global configuration
//! let config = get_config();
//!
//! // Access configuration values
//! let port = config.get_http_port();
//!
//! // Update configuration values
//! config.set_http_port(9000)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("hypefeed.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load HypeFeed configuration"));
}

const ENV_CONFIG_DIR: &str = "HYPEFEED_CONFIG";
const ENV_PREFIX: &str = "HYPEFEED_CONFIG__";
const CONFIG_DIR_NAME: &str = ".hypefeed";

// Default values for configuration
const DEFAULT_HTTP_PORT: u16 = 5555;
const DEFAULT_BASE_URL: &str = "localhost";
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for HypeFeed
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        CONFIG_DIR_NAME.to_string()
    }

    /// Creates the directory if needed and checks it is a writable directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies `HYPEFEED_CONFIG__*` environment overrides
    /// 5. Saves the merged configuration
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or empty to use defaults
    pub fn load_config(directory: &str) -> Result<Self> {
        Self::load_with_overrides(directory, env::vars())
    }

    /// Same as [`Config::load_config`] with an explicit set of override variables
    pub fn load_with_overrides<I>(directory: &str, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config_dir = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&config_dir))?;
        info!(config_dir=%config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file=%path, "Loaded config file");
            data
        } else {
            info!(config_file=%path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        // Merger avec la config par défaut
        let external_value: Value = serde_yaml::from_slice(&yaml_data)?;
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = Self::lower_keys_value(default_value);

        Self::apply_env_overrides(&mut config_value, vars);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    /// Directory holding `config.yaml`
    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let data = self.data.lock().unwrap();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["host", "http_port"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        Self::set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                if let Some(next) = map.get(&Value::String(key.to_lowercase())) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides<I>(config: &mut Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    let new_key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    new_map.insert(new_key, Self::lower_keys_value(v));
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Gets the host name advertised in logs
    ///
    /// Falls back to `localhost` when unset or empty.
    pub fn get_base_url(&self) -> String {
        match self.get_value(&["host", "base_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            Ok(_) => DEFAULT_BASE_URL.to_string(),
            Err(err) => {
                tracing::warn!("Failed to get base URL: {}, using {}", err, DEFAULT_BASE_URL);
                DEFAULT_BASE_URL.to_string()
            }
        }
    }

    /// Gets the HTTP port from configuration
    ///
    /// Returns the configured HTTP port, or the default port (5555) if not configured or invalid.
    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["host", "http_port"]) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|p| u16::try_from(p).ok()) {
                Some(port) => port,
                None => {
                    tracing::warn!("Invalid HTTP port {}, using default {}", n, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(Value::String(s)) => match s.parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    tracing::warn!(
                        "Invalid HTTP port '{}', using default {}",
                        s,
                        DEFAULT_HTTP_PORT
                    );
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(_) => DEFAULT_HTTP_PORT,
            Err(err) => {
                tracing::warn!(
                    "Failed to get HTTP port: {}, using default {}",
                    err,
                    DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
        }
    }

    /// Sets the HTTP port in configuration
    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(&["host", "http_port"], Value::Number(Number::from(port)))
    }

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }
}

/// Returns the global configuration instance
///
/// The instance is lazily loaded on first access.
///
/// # Examples
///
/// ```no_run
/// use hfconfig::get_config;
///
/// let config = get_config();
/// let port = config.get_http_port();
/// ```
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default value.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(dir: &tempfile::TempDir) -> Config {
        Config::load_with_overrides(dir.path().to_str().unwrap(), Vec::new()).unwrap()
    }

    #[test]
    fn test_defaults_from_embedded_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&dir);

        assert_eq!(config.get_http_port(), 5555);
        assert_eq!(config.get_base_url(), "localhost");
        assert_eq!(config.get_log_min_level().unwrap(), "INFO");
        assert!(config.get_log_enable_console().unwrap());
        assert!(dir.path().join("config.yaml").exists());
    }

    #[test]
    fn test_external_file_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "host:\n  HTTP_PORT: 8081\n  logger:\n    min_level: DEBUG\n",
        )
        .unwrap();

        let config = load(&dir);
        assert_eq!(config.get_http_port(), 8081);
        assert_eq!(config.get_log_min_level().unwrap(), "DEBUG");
        // untouched defaults survive the merge
        assert!(config.get_log_enable_console().unwrap());
    }

    #[test]
    fn test_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let vars = vec![
            ("HYPEFEED_CONFIG__HOST__HTTP_PORT".to_string(), "6000".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
            (
                "HYPEFEED_CONFIG__SOURCES__HYPEM__POLICY".to_string(),
                "skip_failed".to_string(),
            ),
        ];
        let config = Config::load_with_overrides(dir.path().to_str().unwrap(), vars).unwrap();

        assert_eq!(config.get_http_port(), 6000);
        assert_eq!(
            config.get_value(&["sources", "hypem", "policy"]).unwrap(),
            Value::String("skip_failed".to_string())
        );
    }

    #[test]
    fn test_set_value_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&dir);
        config.set_http_port(7000).unwrap();

        let reloaded = load(&dir);
        assert_eq!(reloaded.get_http_port(), 7000);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&dir);
        let err = config.get_value(&["host", "nope"]).unwrap_err();
        assert!(err.to_string().contains("host.nope"));
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&dir);
        config
            .set_value(&["host", "http_port"], Value::String("abc".into()))
            .unwrap();
        assert_eq!(config.get_http_port(), DEFAULT_HTTP_PORT);
    }
}
