use axum::{middleware, Router};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::auth::require_session;
use super::catalog::RESOURCES;
use super::handlers;
use super::types::AppState;
use crate::config::Config;
use crate::db;

pub fn build_router(state: AppState) -> Router {
    let mut open = Router::new()
        .merge(handlers::core::routes())
        .merge(handlers::auth::public_routes())
        .merge(handlers::academics::routes());
    let mut guarded = handlers::auth::session_routes();

    for resource in RESOURCES {
        if resource.requires_session {
            guarded = guarded.merge(handlers::resources::routes(resource));
        } else {
            open = open.merge(handlers::resources::routes(resource));
        }
    }

    let guarded = guarded.route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_session,
    ));

    open.merge(guarded)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Opening database...");
    let pool = db::open_pool(&config)?;

    let bind = config.bind.clone();
    let app = build_router(AppState::new(pool, config));

    info!("Binding to {bind}");
    let listener = TcpListener::bind(&bind).await?;
    info!("Server running on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
