use anyhow::Context;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub core: CoreConfig,
    pub store: StoreConfig,
    pub moderation: ModerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Windows and thresholds for the in-memory core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Inactivity after which a visitor no longer counts as online
    #[serde(default = "CoreConfig::default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    /// How long a rating can be edited by resubmitting
    #[serde(default = "CoreConfig::default_edit_window_secs")]
    pub edit_window_secs: u64,
    /// Maximum age of the cached rating aggregate
    #[serde(default = "CoreConfig::default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Interval of the background stale-session sweep
    #[serde(default = "CoreConfig::default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// External rating store endpoint; no store is attached when unset
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "StoreConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// JSON filter policy replacing the built-in one
    #[serde(default)]
    pub policy_path: Option<String>,
}

fn seconds(value: u64, fallback: TimeDelta) -> TimeDelta {
    i64::try_from(value)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(fallback)
}

impl CoreConfig {
    const fn default_session_timeout_secs() -> u64 {
        15 * 60
    }

    const fn default_edit_window_secs() -> u64 {
        3 * 24 * 60 * 60
    }

    const fn default_cache_ttl_secs() -> u64 {
        5 * 60
    }

    const fn default_sweep_interval_secs() -> u64 {
        60
    }

    pub fn session_timeout(&self) -> TimeDelta {
        seconds(self.session_timeout_secs, TimeDelta::minutes(15))
    }

    pub fn edit_window(&self) -> TimeDelta {
        seconds(self.edit_window_secs, TimeDelta::days(3))
    }

    pub fn cache_ttl(&self) -> TimeDelta {
        seconds(self.cache_ttl_secs, TimeDelta::minutes(5))
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: Self::default_session_timeout_secs(),
            edit_window_secs: Self::default_edit_window_secs(),
            cache_ttl_secs: Self::default_cache_ttl_secs(),
            sweep_interval_secs: Self::default_sweep_interval_secs(),
        }
    }
}

impl StoreConfig {
    const fn default_timeout_secs() -> u64 {
        10
    }
}

/// Parse a duration in whole seconds that must fit a `TimeDelta`
fn parse_secs(name: &str, raw: &str) -> anyhow::Result<u64> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{name} must be a non-negative integer, got '{raw}'"))?;

    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .with_context(|| format!("{name} is out of range, got '{raw}'"))?;

    Ok(secs)
}

fn env_secs(name: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(name) {
        Ok(raw) => parse_secs(name, &raw),
        Err(_) => Ok(default),
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let core = CoreConfig {
            session_timeout_secs: env_secs(
                "SESSION_TIMEOUT_SECS",
                CoreConfig::default_session_timeout_secs(),
            )?,
            edit_window_secs: env_secs(
                "RATING_EDIT_WINDOW_SECS",
                CoreConfig::default_edit_window_secs(),
            )?,
            cache_ttl_secs: env_secs("RATING_CACHE_TTL_SECS", CoreConfig::default_cache_ttl_secs())?,
            sweep_interval_secs: env_secs(
                "SESSION_SWEEP_INTERVAL_SECS",
                CoreConfig::default_sweep_interval_secs(),
            )?,
        };

        let store = StoreConfig {
            url: env_opt("RATING_STORE_URL"),
            timeout_secs: env_secs(
                "RATING_STORE_TIMEOUT_SECS",
                StoreConfig::default_timeout_secs(),
            )?,
        };

        let moderation = ModerationConfig {
            policy_path: env_opt("FILTER_POLICY_PATH"),
        };

        Ok(Config {
            server: ServerConfig { host, port },
            core,
            store,
            moderation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_defaults() {
        let core = CoreConfig::default();

        assert_eq!(core.session_timeout(), TimeDelta::minutes(15));
        assert_eq!(core.edit_window(), TimeDelta::days(3));
        assert_eq!(core.cache_ttl(), TimeDelta::minutes(5));
    }

    #[test]
    fn test_oversized_window_falls_back() {
        let core = CoreConfig {
            session_timeout_secs: u64::MAX,
            ..CoreConfig::default()
        };
        assert_eq!(core.session_timeout(), TimeDelta::minutes(15));
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("SESSION_TIMEOUT_SECS", " 600 ").unwrap(), 600);
        assert!(parse_secs("SESSION_TIMEOUT_SECS", "-5").is_err());
        assert!(parse_secs("SESSION_TIMEOUT_SECS", "soon").is_err());

        let err = parse_secs("RATING_EDIT_WINDOW_SECS", &u64::MAX.to_string()).unwrap_err();
        assert!(err.to_string().contains("RATING_EDIT_WINDOW_SECS is out of range"));
        assert!(parse_secs("RATING_EDIT_WINDOW_SECS", &i64::MAX.to_string()).is_err());
    }

    #[test]
    fn test_core_config_deserializes_with_defaults() {
        let core: CoreConfig = serde_json::from_str(r#"{"cache_ttl_secs": 30}"#).unwrap();

        assert_eq!(core.cache_ttl(), TimeDelta::seconds(30));
        assert_eq!(core.session_timeout_secs, 900);
    }
}
