//! sqlgate server binary.

use std::sync::Arc;

use sqlgate_core::Gateway;
use sqlgate_postgres::PgConnector;
use sqlgate_server::{
    router, AppState, GatewayHandler, GroqTranslator, ServerConfig, SignatureVerifier,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let connector = PgConnector::from_url(&config.database_url)?;
    let gateway = Arc::new(
        Gateway::<PgConnector>::builder()
            .pool_config(config.pool_config())
            .query_timeout(config.query_timeout)
            .max_rows(config.max_rows)
            .keyword_policy(config.keyword_policy())
            .build(connector)
            .await?,
    );
    tracing::info!(
        pool_max = config.pool_max_connections,
        timeout_secs = config.query_timeout.as_secs(),
        max_rows = config.max_rows,
        "gateway ready"
    );

    let translator = GroqTranslator::new(&config.groq_api_key, &config.groq_model);
    let handler = GatewayHandler::new(Arc::clone(&gateway), translator);
    let state = AppState::new(SignatureVerifier::new(&config.slack_signing_secret), handler);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, model = %config.groq_model, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    gateway.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
