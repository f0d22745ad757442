use crate::core::space_chat::{QueryReply, SpaceChat};
use crate::error::BridgeError;
use crate::spaces::Space;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

pub type ChatState = State<Arc<SpaceChat>>;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub prompt: String,
    #[serde(rename = "conversationId", default)]
    pub conversation_id: Option<String>,
    /// Accepted for compatibility with existing UIs; not used.
    #[serde(default)]
    pub context: Option<String>,
}

/// Any upstream failure, rendered as `500 {"detail": message}`.
#[derive(Debug)]
pub struct ApiError(BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.0.to_string() })),
        )
            .into_response()
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_spaces(State(chat): ChatState) -> Result<Json<Vec<Value>>, ApiError> {
    match chat.upstream().list_spaces().await {
        Ok(spaces) => Ok(Json(spaces)),
        Err(err) => {
            error!(error = %err, "Error listing spaces");
            Err(err.into())
        }
    }
}

pub async fn get_space(
    State(chat): ChatState,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<Space>, ApiError> {
    let space_ref = format!("{owner}/{name}");
    Ok(Json(chat.upstream().get_space(&space_ref).await?))
}

pub async fn query_space(
    State(chat): ChatState,
    Path((owner, name)): Path<(String, String)>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryReply>, ApiError> {
    if request.context.is_some() {
        debug!("Ignoring client-supplied context on query");
    }

    chat.ask(
        &owner,
        &name,
        &request.prompt,
        request.conversation_id.as_deref(),
    )
    .await
    .map(Json)
    .map_err(|err| {
        error!(space_ref = %format!("{owner}/{name}"), error = %err, "Error querying space");
        ApiError::from(err)
    })
}
