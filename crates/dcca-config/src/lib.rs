use dcca_shared::{ServerIdentity, SessionConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// `host` + `realm` pair, used for both origin and destination
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HostRealm {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(length(min = 1))]
    pub realm: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TargetSettings {
    #[validate(length(min = 1))]
    pub msisdn: String,
}

/// Diameter peer the client connects to
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PeerSettings {
    #[validate(length(min = 1))]
    pub address: String,
    #[serde(default = "default_answer_timeout_ms")]
    #[validate(range(min = 1))]
    pub answer_timeout_ms: u64,
    /// Pause between capability exchange and the first request
    #[serde(default)]
    pub connect_delay_ms: u64,
}

impl PeerSettings {
    pub fn answer_timeout(&self) -> Duration {
        Duration::from_millis(self.answer_timeout_ms)
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }
}

/// Client configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClientSettings {
    #[validate(nested)]
    pub origin: HostRealm,
    #[validate(nested)]
    pub destination: HostRealm,
    #[validate(length(min = 1))]
    pub msisdn: String,
    #[validate(nested)]
    pub target: TargetSettings,
    #[validate(length(min = 1))]
    pub imsi: String,
    #[validate(nested)]
    pub peer: PeerSettings,
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub log_level: String,
}

impl ClientSettings {
    /// Immutable identity/subscriber value handed to the session driver
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(
            &self.origin.host,
            &self.origin.realm,
            &self.destination.host,
            &self.destination.realm,
            &self.msisdn,
            &self.target.msisdn,
            &self.imsi,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListenSettings {
    #[serde(default = "default_listen_address")]
    #[validate(length(min = 1))]
    pub address: String,
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
        }
    }
}

/// Server configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerSettings {
    #[validate(nested)]
    pub origin: HostRealm,
    #[serde(default)]
    #[validate(nested)]
    pub listen: ListenSettings,
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub log_level: String,
}

impl ServerSettings {
    pub fn identity(&self) -> ServerIdentity {
        ServerIdentity::new(&self.origin.host, &self.origin.realm)
    }
}

fn default_answer_timeout_ms() -> u64 {
    5000
}

fn default_listen_address() -> String {
    "0.0.0.0:3868".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from file, overridable through `DCCA__*` variables
/// (e.g. `DCCA__ORIGIN__HOST`)
pub fn load_config<T>(path: &str) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Validate,
{
    let config: T = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(
            config::Environment::with_prefix("DCCA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ConfigError::LoadError(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError(e.to_string()))?;

    config
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    Ok(config)
}

/// Load configuration from YAML string (for testing)
pub fn load_from_yaml<T>(yaml: &str) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Validate,
{
    let config: T =
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::LoadError(e.to_string()))?;
    config
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    Ok(config)
}
