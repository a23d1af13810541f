//! Configuration types for the HTTP service
//!
//! Server and logging settings come from layered sources through the
//! `config` crate:
//!  1. `./config/service.yaml` (optional)
//!  2. the file named by `MEMBER_SYNC_CONFIG_FILE` (required when set)
//!  3. `MEMBER_SYNC__*` environment variables, e.g.
//!     `MEMBER_SYNC__SERVER__PORT=8080`
//!  4. `PORT`, which overrides `server.port`
//!
//! Bridge settings (secrets, upstream URLs) use the plain variable names of
//! the deployment environment, such as `FUNGIES_WEBHOOK_SECRET`.

use std::collections::HashMap;
use std::fmt;

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Variable naming an extra configuration file.
pub const CONFIG_FILE_VAR: &str = "MEMBER_SYNC_CONFIG_FILE";

/// Prefix of structured environment overrides.
pub const ENV_PREFIX: &str = "MEMBER_SYNC";

/// Variable overriding the listening port.
pub const PORT_VAR: &str = "PORT";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upstream credentials and gating
    #[serde(skip)]
    pub bridge: BridgeSettings,
}

impl ServiceConfig {
    /// Load from the process environment and the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(&env)
    }

    /// Load with `env` standing in for the process environment.
    pub fn load_from(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(
            File::with_name("config/service")
                .required(false)
                .format(FileFormat::Yaml),
        );

        if let Some(path) = env.get(CONFIG_FILE_VAR).filter(|p| !p.trim().is_empty()) {
            builder = builder.add_source(
                File::with_name(path)
                    .required(true)
                    .format(FileFormat::Yaml),
            );
        }

        let layered = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .source(Some(env.clone())),
            )
            .build()?;

        let mut config: ServiceConfig = layered.try_deserialize()?;

        if let Some(port) = env.get(PORT_VAR).filter(|p| !p.trim().is_empty()) {
            config.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                message: format!("{} must be a port number, got '{}'", PORT_VAR, port),
            })?;
        }

        config.bridge = BridgeSettings::from_env_map(env)?;
        Ok(config)
    }

    /// Check the settings the server cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "server.host must not be empty".to_string(),
            });
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must not be 0".to_string(),
            });
        }
        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level applied to the service crates when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Credentials, upstream URLs and gating for the bridge.
///
/// Every field is optional: absence only matters to the request that needs
/// the value. Empty values count as absent.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BridgeSettings {
    #[serde(default, rename = "fungies_webhook_secret")]
    pub webhook_secret: Option<String>,

    #[serde(default)]
    pub ghost_admin_api_key: Option<String>,

    #[serde(default)]
    pub ghost_api_url: Option<String>,

    #[serde(default, rename = "fungies_write_api_key")]
    pub write_api_key: Option<String>,

    #[serde(default, rename = "fungies_read_api_key")]
    pub read_api_key: Option<String>,

    #[serde(default, rename = "fungies_product_id")]
    pub product_id: Option<String>,

    #[serde(default, rename = "fungies_public_key")]
    pub public_key: Option<String>,

    #[serde(default, rename = "fungies_secret_key")]
    pub secret_key: Option<String>,

    #[serde(default, rename = "fungies_api_url")]
    pub api_url: Option<String>,

    #[serde(default)]
    pub public_base_url: Option<String>,
}

impl BridgeSettings {
    pub const FUNGIES_WEBHOOK_SECRET: &'static str = "FUNGIES_WEBHOOK_SECRET";
    pub const GHOST_ADMIN_API_KEY: &'static str = "GHOST_ADMIN_API_KEY";
    pub const GHOST_API_URL: &'static str = "GHOST_API_URL";
    pub const FUNGIES_PUBLIC_KEY: &'static str = "FUNGIES_PUBLIC_KEY";
    pub const FUNGIES_SECRET_KEY: &'static str = "FUNGIES_SECRET_KEY";
    pub const FUNGIES_API_URL: &'static str = "FUNGIES_API_URL";
    pub const PUBLIC_BASE_URL: &'static str = "PUBLIC_BASE_URL";

    /// Read the settings from `env` (variable name to value).
    pub fn from_env_map(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        // Only the bridge variables are handed over; unrelated variables
        // could otherwise collide with nested keys.
        let relevant: HashMap<String, String> = env
            .iter()
            .filter(|(name, _)| Self::VARIABLES.contains(&name.to_uppercase().as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let settings: BridgeSettings = Config::builder()
            .add_source(Environment::default().source(Some(relevant)))
            .build()?
            .try_deserialize()?;

        Ok(settings.normalized())
    }

    const VARIABLES: &'static [&'static str] = &[
        "FUNGIES_WEBHOOK_SECRET",
        "GHOST_ADMIN_API_KEY",
        "GHOST_API_URL",
        "FUNGIES_WRITE_API_KEY",
        "FUNGIES_READ_API_KEY",
        "FUNGIES_PRODUCT_ID",
        "FUNGIES_PUBLIC_KEY",
        "FUNGIES_SECRET_KEY",
        "FUNGIES_API_URL",
        "PUBLIC_BASE_URL",
    ];

    /// Trim every value and drop the empty ones.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            webhook_secret: clean(self.webhook_secret),
            ghost_admin_api_key: clean(self.ghost_admin_api_key),
            ghost_api_url: clean(self.ghost_api_url),
            write_api_key: clean(self.write_api_key),
            read_api_key: clean(self.read_api_key),
            product_id: clean(self.product_id),
            public_key: clean(self.public_key),
            secret_key: clean(self.secret_key),
            api_url: clean(self.api_url),
            public_base_url: clean(self.public_base_url),
        }
    }

    /// Payment provider API base, falling back to the public endpoint.
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(member_sync_core::checkout::DEFAULT_API_URL)
    }

    /// Whether an inbound API key is required.
    pub fn api_key_gate_enabled(&self) -> bool {
        self.write_api_key.is_some() || self.read_api_key.is_some()
    }

    /// Names of unset variables that some endpoint needs.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let required = [
            (Self::FUNGIES_WEBHOOK_SECRET, &self.webhook_secret),
            (Self::GHOST_ADMIN_API_KEY, &self.ghost_admin_api_key),
            (Self::GHOST_API_URL, &self.ghost_api_url),
            (Self::FUNGIES_PUBLIC_KEY, &self.public_key),
            (Self::FUNGIES_SECRET_KEY, &self.secret_key),
        ];

        required
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect()
    }
}

impl fmt::Debug for BridgeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn presence(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<REDACTED>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("BridgeSettings")
            .field("webhook_secret", &presence(&self.webhook_secret))
            .field("ghost_admin_api_key", &presence(&self.ghost_admin_api_key))
            .field("ghost_api_url", &self.ghost_api_url)
            .field("write_api_key", &presence(&self.write_api_key))
            .field("read_api_key", &presence(&self.read_api_key))
            .field("product_id", &self.product_id)
            .field("public_key", &self.public_key)
            .field("secret_key", &presence(&self.secret_key))
            .field("api_url", &self.api_url)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
