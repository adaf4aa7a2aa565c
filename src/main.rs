use anyhow::Context;
use subscription_intake::{config::AppConfig, App};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // We have a different logging mechanism for production
    #[cfg(not(debug_assertions))]
    {
        subscription_intake::init_production_tracing()
    }
    #[cfg(debug_assertions)]
    {
        subscription_intake::init_dbg_tracing();
    }

    // A missing store url or key stops the process here, before anything gets bound.
    let config = AppConfig::load()
        .inspect_err(|er| tracing::error!("Fatal Error: Building config: {er}"))
        .context("failed to load the configuration")?;
    let app = App::build_from_config(config)
        .await
        .context("failed to build the app")?;

    subscription_intake::serve(app)
        .await
        .context("server error")?;

    Ok(())
}
