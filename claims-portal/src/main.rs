use anyhow::Context;
use claims_portal::{
    AppState, FileLocalStore, InMemoryLocalStore, LocalStore, LogFormat, Portal, PortalClient,
    PortalConfig, SessionContext, build_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Structured JSON logs unless `LOG_FORMAT=pretty`.
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "claims_portal=debug,claims_view=debug,tower_http=debug".into()
    });

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PortalConfig::from_env().context("Invalid portal configuration")?;
    init_tracing(config.log_format);

    let store: Arc<dyn LocalStore> = match &config.state_path {
        Some(path) => {
            info!(path = %path.display(), "Using file-backed local state");
            Arc::new(FileLocalStore::new(path))
        }
        None => {
            info!("Using in-memory local state (set STATE_PATH to persist it)");
            Arc::new(InMemoryLocalStore::new())
        }
    };

    let session = SessionContext::load(store)
        .await
        .context("Failed to load local state")?;
    let client = PortalClient::new(config.api_base_url.clone());
    let state = AppState {
        portal: Arc::new(Portal::new(client, session)),
    };

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        listen = %addr,
        api_base_url = %config.api_base_url,
        "Claims portal running"
    );

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
