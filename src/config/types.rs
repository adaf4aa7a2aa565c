//! The configuration structs used to build the AppConfig, and their impls.
use std::time::Duration;

use axum::http::HeaderValue;
use lazy_regex::regex_is_match;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use strum_macros::AsRefStr;
use tower_http::cors::AllowOrigin;

use crate::config::{ConfigError, ConfigResult};

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub cors_config: CorsConfig,
    pub store_config: StoreConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    /// `"*"` allows any origin, anything else is matched exactly.
    pub allowed_origin: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct StoreConfig {
    pub url: String,
    #[serde(deserialize_with = "secret_from_scalar")]
    pub key: SecretString,
    #[serde(default = "default_table")]
    pub table: String,
    pub timeout_millis: u64,
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_table() -> String {
    "subscriptions".to_string()
}

/// Accepts a number as well, since a toml file may hold a digits-only key unquoted.
fn secret_from_scalar<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    let key = match Scalar::deserialize(deserializer)? {
        Scalar::Text(text) => text,
        Scalar::Unsigned(num) => num.to_string(),
        Scalar::Signed(num) => num.to_string(),
    };
    Ok(SecretString::from(key))
}

/// The backend a `StoreConfig` points to, decided by the scheme of its url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Rest,
    Postgres,
}

// ###################################
// ->   IMPLs
// ###################################
impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }

    pub fn kind(&self) -> StoreKind {
        let url = self.url.trim().to_ascii_lowercase();
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            StoreKind::Postgres
        } else {
            StoreKind::Rest
        }
    }

    /// The table name ends up in a URL path or an SQL statement, so only plain identifiers pass.
    pub fn valid_table(&self) -> ConfigResult<&str> {
        if regex_is_match!(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$", &self.table) {
            Ok(&self.table)
        } else {
            Err(ConfigError::InvalidTableName(self.table.clone()))
        }
    }
}

impl CorsConfig {
    pub fn allow_origin(&self) -> ConfigResult<AllowOrigin> {
        let origin = self.allowed_origin.trim();
        if origin == "*" {
            return Ok(AllowOrigin::any());
        }

        let value = HeaderValue::from_str(origin)
            .map_err(|_| ConfigError::InvalidCorsOrigin(origin.to_string()))?;
        Ok(AllowOrigin::list([value]))
    }
}

// ###################################
// ->   TRY FROMs
// ###################################
impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail(value)),
        }
    }
}
