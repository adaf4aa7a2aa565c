//! Spawns the app on a random port with a mock server standing in for the row store.
use std::{net::SocketAddr, sync::OnceLock};

use anyhow::Result;
use reqwest::Response;
use secrecy::SecretString;
use serde_json::{json, Value};
use subscription_intake::{
    config::{AppConfig, CorsConfig, NetConfig, StoreConfig},
    init_dbg_tracing, App,
};
use wiremock::MockServer;

pub struct TestApp {
    pub addr: SocketAddr,
    pub http_client: reqwest::Client,
    pub store_server: MockServer,
}

fn _init_test_subscriber() {
    static SUBSCRIBER: OnceLock<()> = OnceLock::new();
    SUBSCRIBER.get_or_init(|| {
        init_dbg_tracing();
    });
}

/// Port 0 makes the OS pick an available port.
pub fn test_config(store_url: String, allowed_origin: &str) -> AppConfig {
    AppConfig {
        net_config: NetConfig {
            host: [127, 0, 0, 1],
            app_port: 0,
        },
        cors_config: CorsConfig {
            allowed_origin: allowed_origin.to_string(),
        },
        store_config: StoreConfig {
            url: store_url,
            key: SecretString::from("test-service-key"),
            table: "subscriptions".to_string(),
            timeout_millis: 200,
            run_migrations: false,
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Result<TestApp> {
        Self::spawn_with_origin("*").await
    }

    /// A helper function that tries to spawn a separate task to serve our app
    /// with the given CORS origin.
    pub async fn spawn_with_origin(allowed_origin: &str) -> Result<TestApp> {
        // _init_test_subscriber();

        let store_server = MockServer::start().await;
        let config = test_config(store_server.uri(), allowed_origin);

        let app = App::build_from_config(config).await?;
        let addr = app.local_addr()?;

        tokio::spawn(subscription_intake::serve(app));

        Ok(TestApp {
            addr,
            http_client: reqwest::Client::new(),
            store_server,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn post_subscribe(&self, body: &Value) -> Result<Response> {
        let res = self
            .http_client
            .post(self.url("/subscribe"))
            .json(body)
            .send()
            .await?;
        Ok(res)
    }
}

/// A row the way the store echoes it back after an insert.
pub fn stored_row(email: Option<&str>, phone_number: Option<&str>, subscription_type: &str) -> Value {
    json!({
        "id": 1,
        "email": email,
        "phone_number": phone_number,
        "subscription_type": subscription_type,
        "is_active": true,
        "created_at": "2024-10-19T12:00:00+00:00",
    })
}
