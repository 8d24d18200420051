use crate::error::{missing_field_path, to_env_var, ConfigError, ENV_PREFIX};
use config::{Config, Environment, File};
use docchat::ErrorPolicy;
use serde::Deserialize;
use std::net::SocketAddr;
use url::Url;

const CONFIG_FILE: &str = "docchat";

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchSettings {
    /// Absolute URL of the documentation search endpoint
    pub url: String,
    /// Bearer token sent with every search call
    pub api_key: String,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl SearchSettings {
    pub fn search_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.url).map_err(|source| ConfigError::InvalidSearchUrl {
            url: self.url.clone(),
            source,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub search: SearchSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        // Start with default configuration
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("search.error_policy", ErrorPolicy::default().to_string())?
            // Optional docchat.toml in the working directory
            .add_source(File::with_name(CONFIG_FILE).required(false))
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = match config.try_deserialize() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                if let Some(field) = missing_field_path(&err.to_string()) {
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&settings_path(&field)),
                    });
                }
                if let config::ConfigError::NotFound(field) = &err {
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                }
                return Err(ConfigError::Other(err));
            }
        };

        // Fail at startup rather than on the first chat request
        settings.search.search_url()?;
        settings.server.socket_addr()?;
        Ok(settings)
    }
}

// serde reports nested missing fields without their table
fn settings_path(field: &str) -> String {
    match field {
        "url" | "api_key" | "error_policy" => format!("search.{}", field),
        "host" | "port" => format!("server.{}", field),
        other => other.to_string(),
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}
