//! HTTP+SSE transport: `GET /sse` opens a session stream whose first
//! `endpoint` event names the URL to POST messages to; responses come back as
//! `message` events on that stream.

use super::McpServer;
use crate::error::BridgeError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

type SessionMap = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<String>>>>;

#[derive(Clone)]
struct SseState {
    server: Arc<McpServer>,
    sessions: SessionMap,
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: String,
}

/// Unregisters a session when its event stream is dropped.
struct SessionGuard {
    id: String,
    sessions: SessionMap,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
        debug!(session_id = %self.id, "MCP SSE session closed");
    }
}

pub fn router(server: Arc<McpServer>) -> Router {
    let state = SseState {
        server,
        sessions: Arc::new(Mutex::new(HashMap::new())),
    };
    Router::new()
        .route("/sse", get(open_stream))
        .route("/messages", post(post_message))
        .route("/messages/", post(post_message))
        .with_state(state)
}

pub async fn run(port: u16, server: McpServer) -> Result<(), BridgeError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "MCP server listening (SSE at /sse)");
    axum::serve(listener, router(Arc::new(server)))
        .with_graceful_shutdown(crate::rest::shutdown_signal())
        .await?;
    info!("MCP server stopped");
    Ok(())
}

async fn open_stream(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().simple().to_string();
    let (sender, receiver) = mpsc::unbounded_channel::<String>();
    state
        .sessions
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(session_id.clone(), sender);
    debug!(session_id = %session_id, "MCP SSE session opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={session_id}"));
    let guard = SessionGuard {
        id: session_id,
        sessions: Arc::clone(&state.sessions),
    };

    let events = stream::unfold(
        (Some(endpoint), receiver, guard),
        |(pending, mut receiver, guard)| async move {
            if let Some(event) = pending {
                return Some((Ok(event), (None, receiver, guard)));
            }
            let message = receiver.recv().await?;
            let event = Event::default().event("message").data(message);
            Some((Ok(event), (None, receiver, guard)))
        },
    );

    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let sender = state
        .sessions
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&query.session_id)
        .cloned();
    let Some(sender) = sender else {
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };

    let server = Arc::clone(&state.server);
    tokio::spawn(async move {
        let Some(response) = server.handle_message(&body).await else {
            return;
        };
        match serde_json::to_string(&response) {
            Ok(payload) => {
                if sender.send(payload).is_err() {
                    debug!("MCP SSE session closed before the response was sent");
                }
            }
            Err(err) => warn!(error = %err, "Failed to encode MCP response"),
        }
    });

    StatusCode::ACCEPTED.into_response()
}
