use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub providers: ProviderConfig,
    pub storage: StorageConfig,
    pub admin_id: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let geocode_timeout_secs = match optional_var("GEOCODE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    variable: "GEOCODE_TIMEOUT_SECS",
                })?,
            None => 10,
        };

        let providers = ProviderConfig {
            tavily_api_key: optional_var("TAVILY_API_KEY"),
            tavily_base_url: optional_var("TAVILY_BASE_URL")
                .unwrap_or_else(|| "https://api.tavily.com".to_string()),
            openai_api_key: optional_var("OPENAI_API_KEY"),
            openai_base_url: optional_var("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            openai_model: optional_var("OPENAI_MODEL").unwrap_or_else(|| "gpt-5-mini".to_string()),
            nominatim_base_url: optional_var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string()),
            nominatim_user_agent: optional_var("NOMINATIM_USER_AGENT").unwrap_or_else(|| {
                "CalvinistParrotChurchFinder/1.0 (contact@calvinistparrot.local)".to_string()
            }),
            geocode_timeout: Duration::from_secs(geocode_timeout_secs),
        };

        let storage = StorageConfig {
            database_path: optional_var("CHURCH_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/church-finder.sqlite")),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            providers,
            storage,
            admin_id: optional_var("ADMIN_ID"),
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Credentials and endpoints for the crawl, extraction, and geocoding providers.
///
/// API keys stay optional here; a provider reports the missing credential when it is
/// first called so the service can still boot for read-only directory traffic.
#[derive(Clone)]
pub struct ProviderConfig {
    pub tavily_api_key: Option<String>,
    pub tavily_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub nominatim_base_url: String,
    pub nominatim_user_agent: String,
    pub geocode_timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("tavily_api_key", &self.tavily_api_key.as_ref().map(|_| "***"))
            .field("tavily_base_url", &self.tavily_base_url)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("nominatim_base_url", &self.nominatim_base_url)
            .field("nominatim_user_agent", &self.nominatim_user_agent)
            .field("geocode_timeout", &self.geocode_timeout)
            .finish()
    }
}

/// Location of the church directory database.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "TAVILY_API_KEY",
            "OPENAI_API_KEY",
            "OPENAI_MODEL",
            "GEOCODE_TIMEOUT_SECS",
            "CHURCH_DB_PATH",
            "ADMIN_ID",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.providers.openai_model, "gpt-5-mini");
        assert_eq!(config.providers.geocode_timeout, Duration::from_secs(10));
        assert_eq!(
            config.storage.database_path,
            PathBuf::from("data/church-finder.sqlite")
        );
        assert!(config.admin_id.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn blank_credentials_are_treated_as_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TAVILY_API_KEY", "   ");
        env::set_var("OPENAI_API_KEY", "sk-test");
        let config = AppConfig::load().expect("config loads");
        assert!(config.providers.tavily_api_key.is_none());
        assert_eq!(config.providers.openai_api_key.as_deref(), Some("sk-test"));
        assert!(!format!("{:?}", config.providers).contains("sk-test"));
        reset_env();
    }

    #[test]
    fn rejects_invalid_geocode_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GEOCODE_TIMEOUT_SECS", "soon");
        let err = AppConfig::load().expect_err("timeout must be numeric");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                variable: "GEOCODE_TIMEOUT_SECS"
            }
        ));
        reset_env();
    }
}
