use crate::core::{LedgerError, Result};
use crate::web::routes::{router, AppState};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Binds `addr` and serves the ledger API until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LedgerError::IoError(format!("Failed to bind {addr}: {e}")))?;
    info!(%addr, "Ledger API listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| LedgerError::IoError(format!("Server error: {e}")))
}
