//! Extension pour intégrer hypem dans hfconfig
//!
//! Ce module fournit le trait `HypemConfigExt` qui ajoute les réglages de
//! la source hypem à `hfconfig::Config`, et [`HypemSettings`] qui les
//! regroupe pour un passage du pipeline.
//!
//! # Exemple
//!
//! ```no_run
//! use hfconfig::get_config;
//! use hfhypem::{HypemConfigExt, HypemSettings};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! println!("Listing page: {}", config.get_hypem_page_url()?);
//!
//! let settings = HypemSettings::from_config(&config)?;
//! println!("Policy: {:?}", settings.policy);
//! # Ok(())
//! # }
//! ```

use crate::client::{SessionCookie, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::extractor::DISPLAY_LIST_MARKER;
use crate::link::DEFAULT_BASE_URL;
use anyhow::{anyhow, Result};
use hfconfig::Config;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default listing page
pub const DEFAULT_PAGE_URL: &str = "http://hypem.com/latest/fresh";

/// Default upper bound for a whole pipeline run (2 minutes)
pub const DEFAULT_PIPELINE_TIMEOUT_SECS: u64 = 120;

/// What to do when one track cannot be resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// The first failing track fails the whole feed
    #[default]
    FailFast,
    /// Failing tracks are left out and reported
    SkipFailed,
}

impl ResolutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::FailFast => "fail_fast",
            ResolutionPolicy::SkipFailed => "skip_failed",
        }
    }
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(ResolutionPolicy::FailFast),
            "skip_failed" => Ok(ResolutionPolicy::SkipFailed),
            other => Err(anyhow!("unknown resolution policy '{}'", other)),
        }
    }
}

/// Everything one pipeline run needs to know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HypemSettings {
    pub page_url: String,
    pub base_url: String,
    pub marker: String,
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Whole-run deadline, `None` for no limit
    pub pipeline_timeout: Option<Duration>,
    pub policy: ResolutionPolicy,
    pub session: Option<SessionCookie>,
}

impl Default for HypemSettings {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            marker: DISPLAY_LIST_MARKER.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            pipeline_timeout: Some(Duration::from_secs(DEFAULT_PIPELINE_TIMEOUT_SECS)),
            policy: ResolutionPolicy::default(),
            session: None,
        }
    }
}

impl HypemSettings {
    /// Reads every `sources.hypem.*` value, persisting missing defaults
    pub fn from_config(config: &Config) -> Result<Self> {
        let pipeline_secs = config.get_hypem_pipeline_timeout_secs()?;
        Ok(Self {
            page_url: config.get_hypem_page_url()?,
            base_url: config.get_hypem_base_url()?,
            marker: config.get_hypem_marker()?,
            user_agent: config.get_hypem_user_agent()?,
            timeout: Duration::from_secs(config.get_hypem_timeout_secs()?),
            pipeline_timeout: (pipeline_secs > 0).then(|| Duration::from_secs(pipeline_secs)),
            policy: config.get_hypem_policy()?,
            session: config.get_hypem_session()?,
        })
    }
}

/// Trait d'extension pour gérer la configuration hypem dans hfconfig
///
/// Les getters persistent automatiquement les valeurs par défaut dans la
/// configuration si elles n'existent pas encore.
pub trait HypemConfigExt {
    /// URL de la page listant les morceaux
    fn get_hypem_page_url(&self) -> Result<String>;
    fn set_hypem_page_url(&self, url: &str) -> Result<()>;

    /// Base des URLs `/serve/source`
    fn get_hypem_base_url(&self) -> Result<String>;
    fn set_hypem_base_url(&self, url: &str) -> Result<()>;

    /// Valeur d'attribut marquant le `<script>` de données
    fn get_hypem_marker(&self) -> Result<String>;
    fn set_hypem_marker(&self, marker: &str) -> Result<()>;

    fn get_hypem_user_agent(&self) -> Result<String>;
    fn set_hypem_user_agent(&self, user_agent: &str) -> Result<()>;

    /// Timeout par requête, en secondes
    fn get_hypem_timeout_secs(&self) -> Result<u64>;
    fn set_hypem_timeout_secs(&self, secs: u64) -> Result<()>;

    /// Durée maximale d'un passage complet, en secondes (0 = illimité)
    fn get_hypem_pipeline_timeout_secs(&self) -> Result<u64>;
    fn set_hypem_pipeline_timeout_secs(&self, secs: u64) -> Result<()>;

    fn get_hypem_policy(&self) -> Result<ResolutionPolicy>;
    fn set_hypem_policy(&self, policy: ResolutionPolicy) -> Result<()>;

    /// Cookie de session, `None` si non configuré
    fn get_hypem_session(&self) -> Result<Option<SessionCookie>>;
    fn set_hypem_session(&self, session: &SessionCookie) -> Result<()>;
}

fn string_or_default(config: &Config, key: &str, default: &str) -> Result<String> {
    match config.get_value(&["sources", "hypem", key]) {
        Ok(Value::String(s)) if !s.is_empty() => Ok(s),
        _ => {
            config.set_value(&["sources", "hypem", key], Value::String(default.to_string()))?;
            Ok(default.to_string())
        }
    }
}

/// Reads a duration in seconds, persisting `default` only when the key is absent
///
/// A value that is present but not a non-negative integer is an error, so
/// a mistyped setting is never overwritten.
fn secs_or_default(config: &Config, key: &str, default: u64) -> Result<u64> {
    match config.get_value(&["sources", "hypem", key]) {
        Ok(Value::Null) | Err(_) => {
            set_secs(config, key, default)?;
            Ok(default)
        }
        Ok(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| anyhow!("sources.hypem.{} must be a non-negative integer, got {}", key, n)),
        Ok(Value::String(s)) => s.trim().parse().map_err(|_| {
            anyhow!("sources.hypem.{} must be a non-negative integer, got '{}'", key, s)
        }),
        Ok(other) => Err(anyhow!(
            "sources.hypem.{} must be a non-negative integer, got {:?}",
            key,
            other
        )),
    }
}

fn set_secs(config: &Config, key: &str, secs: u64) -> Result<()> {
    config.set_value(
        &["sources", "hypem", key],
        Value::Number(serde_yaml::Number::from(secs)),
    )
}

impl HypemConfigExt for Config {
    fn get_hypem_page_url(&self) -> Result<String> {
        string_or_default(self, "page_url", DEFAULT_PAGE_URL)
    }

    fn set_hypem_page_url(&self, url: &str) -> Result<()> {
        self.set_value(&["sources", "hypem", "page_url"], Value::String(url.to_string()))
    }

    fn get_hypem_base_url(&self) -> Result<String> {
        string_or_default(self, "base_url", DEFAULT_BASE_URL)
    }

    fn set_hypem_base_url(&self, url: &str) -> Result<()> {
        self.set_value(&["sources", "hypem", "base_url"], Value::String(url.to_string()))
    }

    fn get_hypem_marker(&self) -> Result<String> {
        string_or_default(self, "marker", DISPLAY_LIST_MARKER)
    }

    fn set_hypem_marker(&self, marker: &str) -> Result<()> {
        self.set_value(&["sources", "hypem", "marker"], Value::String(marker.to_string()))
    }

    fn get_hypem_user_agent(&self) -> Result<String> {
        string_or_default(self, "user_agent", DEFAULT_USER_AGENT)
    }

    fn set_hypem_user_agent(&self, user_agent: &str) -> Result<()> {
        self.set_value(
            &["sources", "hypem", "user_agent"],
            Value::String(user_agent.to_string()),
        )
    }

    fn get_hypem_timeout_secs(&self) -> Result<u64> {
        secs_or_default(self, "timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    fn set_hypem_timeout_secs(&self, secs: u64) -> Result<()> {
        set_secs(self, "timeout_secs", secs)
    }

    fn get_hypem_pipeline_timeout_secs(&self) -> Result<u64> {
        secs_or_default(self, "pipeline_timeout_secs", DEFAULT_PIPELINE_TIMEOUT_SECS)
    }

    fn set_hypem_pipeline_timeout_secs(&self, secs: u64) -> Result<()> {
        set_secs(self, "pipeline_timeout_secs", secs)
    }

    fn get_hypem_policy(&self) -> Result<ResolutionPolicy> {
        match self.get_value(&["sources", "hypem", "policy"]) {
            Ok(Value::String(s)) => s.parse(),
            _ => {
                self.set_hypem_policy(ResolutionPolicy::default())?;
                Ok(ResolutionPolicy::default())
            }
        }
    }

    fn set_hypem_policy(&self, policy: ResolutionPolicy) -> Result<()> {
        self.set_value(
            &["sources", "hypem", "policy"],
            Value::String(policy.as_str().to_string()),
        )
    }

    fn get_hypem_session(&self) -> Result<Option<SessionCookie>> {
        match self.get_value(&["sources", "hypem", "session"]) {
            Ok(Value::Null) | Err(_) => Ok(None),
            Ok(value) => Ok(Some(serde_yaml::from_value(value)?)),
        }
    }

    fn set_hypem_session(&self, session: &SessionCookie) -> Result<()> {
        let value = serde_yaml::to_value(session)?;
        self.set_value(&["sources", "hypem", "session"], value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn config(dir: &tempfile::TempDir) -> Config {
        Config::load_with_overrides(dir.path().to_str().unwrap(), Vec::new()).unwrap()
    }

    #[test]
    fn test_defaults_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);

        let settings = HypemSettings::from_config(&config).unwrap();
        assert_eq!(settings.page_url, DEFAULT_PAGE_URL);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.marker, DISPLAY_LIST_MARKER);
        assert_eq!(settings.policy, ResolutionPolicy::FailFast);
        assert_eq!(settings.session, None);
        assert_eq!(
            settings.pipeline_timeout,
            Some(Duration::from_secs(DEFAULT_PIPELINE_TIMEOUT_SECS))
        );

        let written = std::fs::read_to_string(dir.path().join("config.yaml")).unwrap();
        assert!(written.contains("timeout_secs: 30"));
        assert!(written.contains("policy: fail_fast"));
    }

    #[test]
    fn test_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let session = SessionCookie::new("AUTH", "03%3Aabc", "hypem.com")
            .with_expires(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());

        config.set_hypem_session(&session).unwrap();
        assert_eq!(config.get_hypem_session().unwrap(), Some(session));
    }

    #[test]
    fn test_policy_and_zero_pipeline_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        config.set_hypem_policy(ResolutionPolicy::SkipFailed).unwrap();
        config.set_hypem_pipeline_timeout_secs(0).unwrap();

        let settings = HypemSettings::from_config(&config).unwrap();
        assert_eq!(settings.policy, ResolutionPolicy::SkipFailed);
        assert_eq!(settings.pipeline_timeout, None);
    }

    #[test]
    fn test_invalid_policy_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        config
            .set_value(&["sources", "hypem", "policy"], Value::String("yolo".into()))
            .unwrap();
        assert!(config.get_hypem_policy().is_err());
    }

    #[test]
    fn test_invalid_seconds_are_an_error_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        config
            .set_value(
                &["sources", "hypem", "timeout_secs"],
                Value::Number(serde_yaml::Number::from(-1)),
            )
            .unwrap();

        let err = config.get_hypem_timeout_secs().unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
        assert!(HypemSettings::from_config(&config).is_err());

        let written = std::fs::read_to_string(dir.path().join("config.yaml")).unwrap();
        assert!(written.contains("timeout_secs: -1"));
    }

    #[test]
    fn test_quoted_seconds_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        config
            .set_value(
                &["sources", "hypem", "pipeline_timeout_secs"],
                Value::String("45".into()),
            )
            .unwrap();

        assert_eq!(config.get_hypem_pipeline_timeout_secs().unwrap(), 45);
        config
            .set_value(
                &["sources", "hypem", "pipeline_timeout_secs"],
                Value::String("soon".into()),
            )
            .unwrap();
        assert!(config.get_hypem_pipeline_timeout_secs().is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("skip-failed".parse::<ResolutionPolicy>().unwrap(), ResolutionPolicy::SkipFailed);
        assert_eq!(" FAIL_FAST ".parse::<ResolutionPolicy>().unwrap(), ResolutionPolicy::FailFast);
        assert_eq!(ResolutionPolicy::SkipFailed.to_string(), "skip_failed");
    }
}
