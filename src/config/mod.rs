//! Builds an `AppConfig` from layered sources:
//! `config/base.toml`, then `config/{environment}.toml`, then environment variables.
//!
//! The store url and access key usually come from `STORE_URL` and `STORE_KEY`.
//! Loading fails if either of them is missing so the server never starts without a store.

mod error;
mod types;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::Value,
    Figment,
};
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use types::{AppConfig, CorsConfig, Environment, NetConfig, StoreConfig, StoreKind};

pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";
pub const STORE_URL_VAR: &str = "STORE_URL";
pub const STORE_KEY_VAR: &str = "STORE_KEY";

const STORE_SETTINGS: [(&str, &str); 2] = [
    ("store_config.url", STORE_URL_VAR),
    ("store_config.key", STORE_KEY_VAR),
];

impl AppConfig {
    /// Reads the configuration from the `config` directory in the current working directory
    /// and the process environment.
    pub fn load() -> ConfigResult<AppConfig> {
        let environment: Environment = std::env::var(ENVIRONMENT_VAR)
            .unwrap_or_else(|_| "local".into())
            .try_into()?;
        info!(
            "{:<20} - Loading the {} configuration",
            "config",
            environment.as_ref()
        );

        Self::load_for(environment)
    }

    pub fn load_for(environment: Environment) -> ConfigResult<AppConfig> {
        let config_dir = std::env::current_dir()?.join("config");
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let mut figment = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "net_config.app_port".into()))
            .merge(
                Env::raw()
                    .only(&["CORS_ORIGIN"])
                    .map(|_| "cors_config.allowed_origin".into()),
            );

        // `Env` would parse a digits-only key into a number, so the store settings are taken verbatim.
        for (key, var) in STORE_SETTINGS {
            if let Ok(value) = std::env::var(var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }

        // Report the missing store settings by name instead of a generic "missing field".
        for (key, var) in STORE_SETTINGS {
            if !is_present(figment.find_value(key).ok()) {
                return Err(ConfigError::MissingStoreSetting(var));
            }
        }

        let config: AppConfig = figment.extract()?;
        config.store_config.valid_table()?;
        let _allow_origin = config.cors_config.allow_origin()?;

        Ok(config)
    }
}

/// Any non-blank scalar counts, a toml file may well hold a numeric key.
fn is_present(value: Option<Value>) -> bool {
    match value {
        Some(Value::String(_, value)) => !value.trim().is_empty(),
        Some(Value::Num(..) | Value::Char(..) | Value::Bool(..)) => true,
        _ => false,
    }
}
