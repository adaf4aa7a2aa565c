use reqwest::{header, Client, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{Error, Result};
use crate::web::types::{NewSubscription, SubscriptionRecord};

/// A client for a PostgREST-compatible endpoint: `POST {base_url}/rest/v1/{table}`.
#[derive(Debug)]
pub struct RestStore {
    pub http_client: Client,
    pub table_url: Url,
    api_key: SecretString,
}

impl RestStore {
    pub fn new<S: AsRef<str>>(
        base_url: S,
        table: &str,
        api_key: SecretString,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url.as_ref().trim()).map_err(|e| Error::UrlParsing(e.to_string()))?;
        // `Url::join` replaces the last path segment unless the base ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let table_url = base_url
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(RestStore {
            http_client,
            table_url,
            api_key,
        })
    }

    pub async fn insert_subscription(
        &self,
        record: &NewSubscription<'_>,
    ) -> Result<Vec<SubscriptionRecord>> {
        let resp = self
            .http_client
            .post(self.table_url.clone())
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret())
            // Ask for the inserted row(s) back.
            .header("Prefer", "return=representation")
            .header(header::ACCEPT, "application/json")
            .json(record)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            let rows = resp.json::<Vec<SubscriptionRecord>>().await?;
            return Ok(rows);
        }

        let body = resp.text().await?;
        debug!("{:<20} - status: {status}, body: {body}", "row_store rejected");

        Err(rejection_to_error(status, &body))
    }
}

/// The error body PostgREST sends with a non-success status.
#[derive(Debug, Deserialize)]
struct RestErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Maps a non-success store response to an `Error`.
/// A body that isn't a PostgREST error object is reported with the HTTP status as its code.
fn rejection_to_error(status: StatusCode, body: &str) -> Error {
    let parsed = serde_json::from_str::<RestErrorBody>(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|er| er.code.clone())
        .unwrap_or_else(|| status.as_u16().to_string());
    let message = parsed
        .and_then(|er| er.message)
        .unwrap_or_else(|| body.to_string());

    Error::from_store_code(code, message)
}
