use std::{str::FromStr, time::Duration};

use secrecy::ExposeSecret;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool, Postgres, QueryBuilder,
};
use tracing::info;

use super::{Error, Result};
use crate::{
    config::StoreConfig,
    web::types::{NewSubscription, SubscriptionRecord},
};

/// A direct Postgres connection pool. The configured access key is used as the password.
#[derive(Clone, Debug)]
pub struct PgStore {
    db: PgPool,
    table: String,
}

impl PgStore {
    pub async fn init(config: &StoreConfig) -> Result<Self> {
        info!("{:<20} - Initializing the DB pool", "init_db");
        let max_cons = if cfg!(test) { 1 } else { 5 };

        let table = config
            .valid_table()
            .map_err(|er| Error::InvalidConfig(er.to_string()))?
            .to_string();

        let con_opts = connection_options(config)?;

        let db_pool = PgPoolOptions::new()
            .max_connections(max_cons)
            .acquire_timeout(config.timeout())
            .connect_with(con_opts)
            .await
            .map_err(|ex| Error::FailToCreatePool(ex.to_string()))?;

        if config.run_migrations {
            info!("{:<20} - Running migrations", "init_db");
            sqlx::migrate!("./migrations").run(&db_pool).await?;
        }

        Ok(Self { db: db_pool, table })
    }

    pub async fn insert_subscription(
        &self,
        record: &NewSubscription<'_>,
    ) -> Result<Vec<SubscriptionRecord>> {
        let mut query = insert_query(&self.table, record);

        let rows: Vec<serde_json::Value> = query
            .build_query_scalar()
            .fetch_all(&self.db)
            .await
            .map_err(classify_sqlx_error)?;

        let rows = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<core::result::Result<Vec<SubscriptionRecord>, _>>()?;

        Ok(rows)
    }
}

/// Parses the store url and fills in the access key as the password.
fn connection_options(config: &StoreConfig) -> Result<PgConnectOptions> {
    let con_opts = PgConnectOptions::from_str(config.url.trim())
        .map_err(|er| Error::UrlParsing(er.to_string()))?
        .password(config.key.expose_secret())
        .log_statements(tracing::log::LevelFilter::Trace)
        .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(1));

    Ok(con_opts)
}

/// `INSERT INTO {table} AS t (..) VALUES (..) RETURNING to_jsonb(t)`
/// Only the contact fields that are present become columns, so absent ones keep the column default.
fn insert_query<'a>(table: &str, record: &'a NewSubscription<'a>) -> QueryBuilder<'a, Postgres> {
    let mut columns = vec!["subscription_type", "is_active"];
    if record.email.is_some() {
        columns.push("email");
    }
    if record.phone_number.is_some() {
        columns.push("phone_number");
    }

    let mut query = QueryBuilder::new(format!(
        "INSERT INTO {table} AS t ({}) VALUES (",
        columns.join(", ")
    ));

    let mut values = query.separated(", ");
    values.push_bind(record.subscription_type.as_ref());
    values.push_bind(record.is_active);
    if let Some(email) = record.email {
        values.push_bind(email);
    }
    if let Some(phone_number) = record.phone_number {
        values.push_bind(phone_number);
    }
    query.push(") RETURNING to_jsonb(t)");

    query
}

/// Database errors are reported by the store, everything else (io, pool timeouts, ...) is unexpected.
fn classify_sqlx_error(error: sqlx::Error) -> Error {
    match error {
        sqlx::Error::Database(er) => {
            let code = er.code().map(|c| c.into_owned()).unwrap_or_default();
            Error::from_store_code(code, er.message())
        }
        other => Error::Sqlx(other),
    }
}
