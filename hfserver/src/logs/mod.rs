//! Initialisation du système de logging
//!
//! Le niveau minimum et la sortie console viennent de la configuration
//! (`host.logger.*`). Le filtre est rechargeable à chaud via [`LogState`].

use hfconfig::get_config;
use std::sync::{Arc, RwLock};
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt, Registry,
};

/// Handle partagé sur le filtre de niveau
#[derive(Clone)]
pub struct LogState {
    max_level: Arc<RwLock<Level>>,
    reload_handle: reload::Handle<LevelFilter, Registry>,
}

impl LogState {
    pub fn new(level: Level, reload_handle: reload::Handle<LevelFilter, Registry>) -> Self {
        Self {
            max_level: Arc::new(RwLock::new(level)),
            reload_handle,
        }
    }

    pub fn set_max_level(&self, level: Level) {
        if let Ok(mut current) = self.max_level.write() {
            *current = level;
        }

        if let Err(e) = self.reload_handle.reload(LevelFilter::from_level(level)) {
            tracing::warn!("Failed to reload log level filter: {}", e);
        }
    }

    pub fn get_max_level(&self) -> Level {
        self.max_level
            .read()
            .map(|level| *level)
            .unwrap_or(Level::INFO)
    }
}

/// Options d'initialisation du système de logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub min_level: Level,
    /// Activer la sortie vers stderr/stdout
    pub enable_console: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
            enable_console: true,
        }
    }
}

impl LoggingOptions {
    /// Lit les options depuis la configuration globale
    pub fn from_config() -> Self {
        let config = get_config();
        let defaults = Self::default();

        let min_level = config
            .get_log_min_level()
            .ok()
            .and_then(|l| string_to_level(&l))
            .unwrap_or(defaults.min_level);

        let enable_console = config
            .get_log_enable_console()
            .unwrap_or(defaults.enable_console);

        Self {
            min_level,
            enable_console,
        }
    }
}

/// Installe le subscriber global
///
/// Un second appel (tests, binaire relancé dans le même process) laisse le
/// premier subscriber en place.
pub fn init_logging(options: LoggingOptions) -> LogState {
    let (filter, reload_handle) = reload::Layer::new(LevelFilter::from_level(options.min_level));
    let log_state = LogState::new(options.min_level, reload_handle);

    // Le filtre doit être appliqué en premier
    let subscriber = Registry::default().with(filter);

    let result = if options.enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialised: {}", e);
    }

    log_state
}

pub fn string_to_level(s: &str) -> Option<Level> {
    match s.to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_level() {
        assert_eq!(string_to_level("debug"), Some(Level::DEBUG));
        assert_eq!(string_to_level("Warning"), Some(Level::WARN));
        assert_eq!(string_to_level("TRACE"), Some(Level::TRACE));
        assert_eq!(string_to_level("verbose"), None);
    }

    #[test]
    fn test_set_max_level_updates_state() {
        let state = init_logging(LoggingOptions {
            min_level: Level::INFO,
            enable_console: false,
        });
        assert_eq!(state.get_max_level(), Level::INFO);
        state.set_max_level(Level::DEBUG);
        assert_eq!(state.get_max_level(), Level::DEBUG);
    }
}
