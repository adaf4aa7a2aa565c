use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use tokio::net::TcpListener;
use tower_http::cors::AllowOrigin;
use tracing::info;

use crate::{config::AppConfig, store::RowStore, Result};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub allow_origin: AllowOrigin,
    pub listener: TcpListener,
}

impl App {
    pub fn new(app_state: AppState, allow_origin: AllowOrigin, listener: TcpListener) -> Self {
        App {
            app_state,
            allow_origin,
            listener,
        }
    }

    /// Creates the row store, binds the listener and returns an `App` ready to be served.
    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let allow_origin = config.cors_config.allow_origin()?;
        let row_store = RowStore::init(&config.store_config).await?;
        let app_state = AppState::new(row_store);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        Ok(App::new(app_state, allow_origin, listener))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

pub struct InternalState {
    pub row_store: RowStore,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(row_store: RowStore) -> Self {
        AppState(Arc::new(InternalState { row_store }))
    }
}
