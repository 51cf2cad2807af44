//! Configuration for the board console.
//!
//! Loaded from environment variables (a `.env` file is read first by `main`).

use kinxplore_bookings::UserId;
use kinxplore_bookings::store::BookingStoreConfig;
use kinxplore_supabase::SupabaseConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Log filter used when neither `KINXPLORE_LOG` nor `RUST_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "info,kinxplore=debug";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or blank
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable could not be parsed
    #[error("Invalid value for {variable}: '{value}'")]
    Invalid {
        /// Variable name
        variable: &'static str,
        /// Raw value
        value: String,
    },
}

/// Console configuration
#[derive(Clone)]
pub struct Config {
    /// Supabase project base URL
    pub supabase_url: String,
    /// Public API key
    pub anon_key: String,
    /// Staff session JWT
    pub access_token: Option<String>,
    /// Staff member running the console
    pub actor: UserId,
    /// Longest a command waits for the store
    pub response_timeout: Duration,
    /// Pause before re-subscribing the change feed
    pub resubscribe_delay: Duration,
    /// HTTP client timeout
    pub http_timeout: Duration,
    /// Prometheus exporter port, disabled when `None`
    pub metrics_port: Option<u16>,
    /// `tracing-subscriber` filter directive
    pub log_filter: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("supabase_url", &self.supabase_url)
            .field("actor", &self.actor)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("response_timeout", &self.response_timeout)
            .field("resubscribe_delay", &self.resubscribe_delay)
            .field("http_timeout", &self.http_timeout)
            .field("metrics_port", &self.metrics_port)
            .field("log_filter", &self.log_filter)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            supabase_url: required("SUPABASE_URL")?,
            anon_key: required("SUPABASE_ANON_KEY")?,
            access_token: get("SUPABASE_ACCESS_TOKEN"),
            actor: UserId::new(required("KINXPLORE_ACTOR_ID")?.trim()),
            response_timeout: Duration::from_secs(parse_or(
                "KINXPLORE_RESPONSE_TIMEOUT_SECS",
                get("KINXPLORE_RESPONSE_TIMEOUT_SECS"),
                30,
            )?),
            resubscribe_delay: Duration::from_secs(parse_or(
                "KINXPLORE_RESUBSCRIBE_DELAY_SECS",
                get("KINXPLORE_RESUBSCRIBE_DELAY_SECS"),
                5,
            )?),
            http_timeout: Duration::from_secs(parse_or(
                "KINXPLORE_HTTP_TIMEOUT_SECS",
                get("KINXPLORE_HTTP_TIMEOUT_SECS"),
                20,
            )?),
            metrics_port: get("KINXPLORE_METRICS_PORT")
                .map(|raw| parse("KINXPLORE_METRICS_PORT", &raw))
                .transpose()?,
            log_filter: get("KINXPLORE_LOG")
                .or_else(|| get("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    /// Settings for the PostgREST and realtime clients
    #[must_use]
    pub fn supabase(&self) -> SupabaseConfig {
        let config = SupabaseConfig::new(self.supabase_url.clone(), self.anon_key.clone())
            .with_http_timeout(self.http_timeout);
        match &self.access_token {
            Some(token) => config.with_access_token(token.clone()),
            None => config,
        }
    }

    /// Timing knobs for the booking store
    #[must_use]
    pub const fn store(&self) -> BookingStoreConfig {
        BookingStoreConfig {
            response_timeout: self.response_timeout,
            resubscribe_delay: self.resubscribe_delay,
        }
    }
}

fn parse<T: FromStr>(variable: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        variable,
        value: raw.to_string(),
    })
}

fn parse_or<T: FromStr>(
    variable: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    raw.map_or(Ok(default), |raw| parse(variable, &raw))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SUPABASE_URL", "https://abc.supabase.co"),
        ("SUPABASE_ANON_KEY", "anon"),
        ("KINXPLORE_ACTOR_ID", "admin-1"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.actor.as_str(), "admin-1");
        assert_eq!(config.access_token, None);
        assert_eq!(config.response_timeout, Duration::from_secs(30));
        assert_eq!(config.resubscribe_delay, Duration::from_secs(5));
        assert_eq!(config.http_timeout, Duration::from_secs(20));
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SUPABASE_ACCESS_TOKEN", "jwt"),
            ("KINXPLORE_RESPONSE_TIMEOUT_SECS", "3"),
            ("KINXPLORE_RESUBSCRIBE_DELAY_SECS", " 1 "),
            ("KINXPLORE_HTTP_TIMEOUT_SECS", "7"),
            ("KINXPLORE_METRICS_PORT", "9100"),
            ("RUST_LOG", "warn"),
        ]);

        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.access_token.as_deref(), Some("jwt"));
        assert_eq!(config.response_timeout, Duration::from_secs(3));
        assert_eq!(config.resubscribe_delay, Duration::from_secs(1));
        assert_eq!(config.metrics_port, Some(9100));
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.supabase().http_timeout(), Duration::from_secs(7));
        assert_eq!(config.store().response_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_kinxplore_log_wins_over_rust_log() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([("RUST_LOG", "warn"), ("KINXPLORE_LOG", "trace")]);

        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.log_filter, "trace");
    }

    #[test]
    fn test_missing_and_blank_required_variables() {
        let error = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert_eq!(error, ConfigError::Missing("KINXPLORE_ACTOR_ID"));

        let mut vars = REQUIRED.to_vec();
        vars[1] = ("SUPABASE_ANON_KEY", "  ");
        let error = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(error, ConfigError::Missing("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn test_invalid_number() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("KINXPLORE_METRICS_PORT", "ninety"));

        let error = Config::from_lookup(lookup(&vars)).unwrap_err();

        assert_eq!(
            error,
            ConfigError::Invalid {
                variable: "KINXPLORE_METRICS_PORT",
                value: "ninety".to_string(),
            }
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SUPABASE_ACCESS_TOKEN", "secret-jwt"));

        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert!(!format!("{config:?}").contains("secret-jwt"));
    }
}
