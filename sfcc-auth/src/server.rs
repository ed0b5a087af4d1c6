//! axumサーバー起動・シャットダウンハンドリング

use crate::common::error::LbError;
use crate::AppState;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 起動時の設定状況をログに出す
fn log_startup_warnings(state: &AppState) {
    if state.config.jwt_secret_generated {
        warn!("SFCC_JWT_SECRET is not set; using a per-process secret (tokens will not survive a restart)");
    }
    if state.config.superuser.is_none() {
        warn!("SFCC_ADMIN_PASSWORD_HASH is not set; superuser login is disabled");
    }
    if state.db_pool.is_none() {
        warn!("SFCC_DATABASE_URL is not set; persisted users are unavailable and audit records are not durable");
    }
}

/// axumサーバーを起動し、シャットダウンシグナルを待機する
pub async fn run(state: AppState, bind_addr: &str) -> Result<(), LbError> {
    log_startup_warnings(&state);

    let app = crate::api::create_app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| LbError::Internal(format!("Failed to bind to {}: {}", bind_addr, e)))?;

    info!("SFCC admin API listening on {}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| LbError::Internal(format!("Server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

/// シャットダウンシグナルを待機
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
