//! Entry point for the `problemset-gateway` HTTP server.

use std::{net::SocketAddr, sync::Arc};

use problemset_gateway::{
    config::GatewayConfig,
    handlers::auth::bootstrap_admin,
    rate_limit::{spawn_sweeper, SWEEP_INTERVAL},
    routes::create_router,
    state::AppState,
};
use problemset_store::Store;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "problemset_gateway=info,tower_http=info";

#[tokio::main]
async fn main() {
    // a missing .env file is normal outside development
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    let config = match GatewayConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let store = match problemset_store::open(&config.database_url).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to open store");
            std::process::exit(1);
        }
    };

    if let Some(admin) = &config.bootstrap_admin {
        match bootstrap_admin(&*store, admin, config.bcrypt_cost).await {
            Ok(true) => info!(username = %admin.username, "created bootstrap admin"),
            Ok(false) => info!(username = %admin.username, "bootstrap admin already present"),
            Err(e) => {
                tracing::error!(error = %e, "failed to create bootstrap admin");
                std::process::exit(1);
            }
        }
    }

    let state = AppState::new(Arc::clone(&store), &config);
    let _sweeper = spawn_sweeper(Arc::clone(&state.limiter), SWEEP_INTERVAL);
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %config.listen_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(
        addr = %config.listen_addr,
        store = store.backend_name(),
        session_mode = %config.session_mode,
        "problemset-gateway listening"
    );

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
