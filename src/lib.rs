//! An HTTP service that takes newsletter subscription requests (email and/or phone number),
//! validates them and stores them as rows in a hosted database.

pub mod app;
pub mod config;
mod error;
pub mod store;
mod telemetry;
pub mod web;

// re-exports
pub use app::{App, AppState};
pub use error::{Error, Result};
pub use store::RowStore;
pub use telemetry::{init_dbg_tracing, init_production_tracing};
pub use web::serve;
