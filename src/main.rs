//! Scriptbase's backend web server.

use scriptbase::{
    config::Config,
    db,
    router::{self, AppState},
    store::postgres::PgStore,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// The log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "scriptbase=info,tower_http=info";

/// # Errors
///
/// See implementation.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    tracing::info!("connecting to database and running migrations");

    let pool = db::initialize(&config).await?;

    let listener = TcpListener::bind(&config.address).await?;

    tracing::info!(address = %config.address, "ready");

    let state = AppState {
        store: PgStore::new(pool),
    };

    axum::serve(listener, router::router(state)).await?;

    Ok(())
}
