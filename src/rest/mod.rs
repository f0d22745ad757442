//! REST front end serving the Spaces UI and its JSON API.

use crate::core::space_chat::SpaceChat;
use crate::error::BridgeError;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

pub mod routes;


/// Builds the API routes, plus the UI when `ui_dir` exists.
pub fn router(chat: Arc<SpaceChat>, ui_dir: &Path) -> Router {
    let mut app = Router::new()
        .route("/health", get(routes::health))
        .route("/api/spaces", get(routes::list_spaces))
        .route("/api/spaces/:owner/:name", get(routes::get_space))
        .route("/api/spaces/:owner/:name/query", post(routes::query_space))
        .with_state(chat);

    if ui_dir.is_dir() {
        app = app
            .route_service("/", ServeFile::new(ui_dir.join("index.html")))
            .nest_service("/static", ServeDir::new(ui_dir));
    } else {
        warn!(ui_dir = %ui_dir.display(), "UI directory not found; serving the API only");
    }

    app.layer(CorsLayer::permissive())
}

/// Serves `app` on `listener` until Ctrl+C.
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), BridgeError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("API bridge stopped");
    Ok(())
}

pub async fn run(port: u16, ui_dir: &Path, chat: Arc<SpaceChat>) -> Result<(), BridgeError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "API bridge listening");
    serve(listener, router(chat, ui_dir)).await
}

pub(crate) async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received, shutting down");
}
