//! The Row Store: the external database that persists subscriptions and enforces their uniqueness.
//!
//! `RowStore` is created once at startup and shared by every request.
//! It talks either to a PostgREST-compatible HTTP endpoint or directly to Postgres,
//! depending on the scheme of the configured url.

mod postgres;
mod rest;

pub use postgres::PgStore;
pub use rest::RestStore;

use tracing::info;

use crate::{
    config::{StoreConfig, StoreKind},
    web::types::{NewSubscription, SubscriptionRecord},
};

/// SQLSTATE reported by Postgres (and passed through by PostgREST) when a unique constraint is violated.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

#[derive(Debug)]
pub enum RowStore {
    Rest(RestStore),
    Postgres(PgStore),
}

impl RowStore {
    pub async fn init(config: &StoreConfig) -> Result<Self> {
        let table = config
            .valid_table()
            .map_err(|er| Error::InvalidConfig(er.to_string()))?;

        let store = match config.kind() {
            StoreKind::Rest => {
                info!("{:<20} - Using the REST row store", "row_store");
                RowStore::Rest(RestStore::new(
                    &config.url,
                    table,
                    config.key.clone(),
                    config.timeout(),
                )?)
            }
            StoreKind::Postgres => {
                info!("{:<20} - Using the Postgres row store", "row_store");
                RowStore::Postgres(PgStore::init(config).await?)
            }
        };

        Ok(store)
    }

    /// Inserts a single subscription and returns the inserted row(s) as the store reports them.
    pub async fn insert_subscription(
        &self,
        record: &NewSubscription<'_>,
    ) -> Result<Vec<SubscriptionRecord>> {
        match self {
            RowStore::Rest(store) => store.insert_subscription(record).await,
            RowStore::Postgres(store) => store.insert_subscription(record).await,
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store refused the row because it would duplicate an existing one.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    /// The store processed the request and reported an error of its own.
    #[error("store rejected the request ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
    #[error("url parsing error: {0}")]
    UrlParsing(String),
    #[error("failed to create db pool: {0}")]
    FailToCreatePool(String),
    #[error("failed to decode a row returned by the store: {0}")]
    RowDecode(#[from] serde_json::Error),

    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("sqlx migration error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    /// Classifies an error code reported by the store itself.
    pub fn from_store_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let (code, message) = (code.into(), message.into());
        if code == UNIQUE_VIOLATION_CODE {
            Error::UniqueViolation(message)
        } else {
            Error::Rejected { code, message }
        }
    }
}
