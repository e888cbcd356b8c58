use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Deployment stage the service runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Everything the matching service reads from its environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Missing keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let store_defaults = StoreConfig::default();

        let store = StoreConfig {
            timeout_ms: vars.parsed("FLOWJOB_STORE_TIMEOUT_MS", store_defaults.timeout_ms)?,
            max_attempts: vars.parsed("FLOWJOB_STORE_MAX_ATTEMPTS", store_defaults.max_attempts)?,
            backoff_ms: vars.parsed("FLOWJOB_STORE_BACKOFF_MS", store_defaults.backoff_ms)?,
            max_backoff_ms: vars.parsed(
                "FLOWJOB_STORE_MAX_BACKOFF_MS",
                store_defaults.max_backoff_ms,
            )?,
        };
        if store.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "FLOWJOB_STORE_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            environment: AppEnvironment::parse(&vars.text("APP_ENV", "development")),
            server: ServerConfig {
                host: vars.text("APP_HOST", "127.0.0.1"),
                port: vars.parsed("APP_PORT", 3000)?,
            },
            telemetry: TelemetryConfig {
                log_level: vars.text("APP_LOG_LEVEL", "info"),
                log_format: LogFormat::parse(&vars.text("APP_LOG_FORMAT", "compact")),
            },
            store,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn text(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match (self.0)(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value: raw }),
        }
    }
}

/// HTTP listener binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost {
                    host: self.host.clone(),
                    source,
                })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Full,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" | "verbose" => Self::Full,
            _ => Self::Compact,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Timeout and retry budget applied to every document store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            max_attempts: 3,
            backoff_ms: 50,
            max_backoff_ms: 1_000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("APP_HOST '{host}' is not an IPv4 or IPv6 address")]
    InvalidHost {
        host: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).expect("defaults load");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(
            config.server.socket_addr().expect("default host parses"),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000)
        );
    }

    #[test]
    fn localhost_resolves_to_loopback() {
        let config = config_from(&[("APP_HOST", "LocalHost"), ("APP_PORT", "8088")])
            .expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8088));
    }

    #[test]
    fn store_budget_reads_overrides() {
        let config = config_from(&[
            ("APP_ENV", "ci"),
            ("FLOWJOB_STORE_TIMEOUT_MS", " 750 "),
            ("FLOWJOB_STORE_MAX_ATTEMPTS", "5"),
        ])
        .expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Test);
        assert_eq!(config.store.timeout(), Duration::from_millis(750));
        assert_eq!(config.store.max_attempts, 5);
        assert_eq!(config.store.backoff_ms, 50);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            config_from(&[("FLOWJOB_STORE_MAX_ATTEMPTS", "0")]),
            Err(ConfigError::Invalid {
                key: "FLOWJOB_STORE_MAX_ATTEMPTS",
                ..
            })
        ));
        assert!(matches!(
            config_from(&[("FLOWJOB_STORE_BACKOFF_MS", "soon")]),
            Err(ConfigError::Invalid {
                key: "FLOWJOB_STORE_BACKOFF_MS",
                ..
            })
        ));
        assert!(matches!(
            config_from(&[("APP_PORT", "70000")]),
            Err(ConfigError::Invalid { key: "APP_PORT", .. })
        ));
    }

    #[test]
    fn unparseable_host_is_reported() {
        let config = config_from(&[("APP_HOST", "example dot com")]).expect("config loads");
        let error = config.server.socket_addr().expect_err("host is not an address");
        assert!(error.to_string().contains("example dot com"));
    }
}
