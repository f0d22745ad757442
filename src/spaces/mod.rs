//! Upstream access to Copilot Spaces: listing and fetching Spaces through the
//! remote MCP server, and grounded chat through the completions endpoint.
//!
//! [`SpacesUpstream`] is the seam both front ends depend on; [`SpacesClient`]
//! is the network-backed implementation.

use crate::api::{ChatMessage, CompletionsClient};
use crate::core::config::Settings;
use crate::core::credential::CredentialSource;
use crate::error::BridgeError;
use crate::mcp::client::{build_mcp_http_client, McpEndpoint, McpSession};
use crate::mcp::{TOOL_GET_COPILOT_SPACE, TOOL_LIST_COPILOT_SPACES};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

pub mod fetch;
pub mod listing;
pub mod tool_result;


pub use fetch::{Space, SpaceFile};
use tool_result::ToolCallOutput;

#[async_trait]
pub trait SpacesUpstream: Send + Sync {
    /// Every Space visible to the credential, each with a `space_ref`.
    async fn list_spaces(&self) -> Result<Vec<Value>, BridgeError>;

    /// One Space with its non-empty knowledge files.
    async fn get_space(&self, space_ref: &str) -> Result<Space, BridgeError>;

    /// Sends `messages` to the completions endpoint and returns the raw body.
    async fn query_chat(
        &self,
        space_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Value, BridgeError>;
}

/// A finished tool call plus the outcome of the session teardown that
/// followed it.
struct ToolExchange {
    output: ToolCallOutput,
    teardown: Result<(), String>,
}

pub struct SpacesClient {
    endpoint: McpEndpoint,
    http_client: reqwest::Client,
    completions: CompletionsClient,
    credential: CredentialSource,
}

impl SpacesClient {
    pub fn new(
        endpoint: McpEndpoint,
        completions: CompletionsClient,
        credential: CredentialSource,
    ) -> Result<Self, BridgeError> {
        Ok(Self {
            endpoint,
            http_client: build_mcp_http_client()?,
            completions,
            credential,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, BridgeError> {
        let endpoint = McpEndpoint {
            url: settings.mcp_url.clone(),
            protocol_version: settings.protocol_version.clone(),
        };
        let completions = CompletionsClient::new(&settings.chat_url, &settings.chat_model)?;
        Self::new(endpoint, completions, CredentialSource::default())
    }

    /// Runs one tool call inside its own session.
    ///
    /// The session lives in a spawned task, so it is torn down on every path
    /// once it is open, including when the caller's future is dropped.
    /// Teardown failures after a successful call are handed back to the
    /// caller.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolExchange, BridgeError> {
        let credential = self.credential.resolve()?;
        let endpoint = self.endpoint.clone();
        let http_client = self.http_client.clone();
        let auth_header = credential.bearer_header();
        let tool = name.to_string();

        let session_task = tokio::spawn(async move {
            let mut session = McpSession::open(endpoint, http_client, auth_header).await?;
            let result = session.call_tool(&tool, arguments).await;
            let teardown = session.close().await;
            Ok::<_, String>((result, teardown))
        });
        let (result, teardown) = session_task
            .await
            .map_err(|err| BridgeError::mcp(format!("MCP session task failed: {err}")))?
            .map_err(BridgeError::mcp)?;

        let result = match result {
            Ok(result) => result,
            Err(err) => {
                if let Err(teardown) = teardown {
                    debug!(error = %teardown, "MCP session teardown after failed tool call also failed");
                }
                return Err(BridgeError::mcp(err));
            }
        };

        let output = ToolCallOutput::from_result(&result);
        if output.is_error {
            warn!(tool = name, "MCP tool reported an error result");
        }
        Ok(ToolExchange { output, teardown })
    }
}

/// Resolves a late teardown failure: once `captured` data is in hand the
/// failure is only logged, otherwise it becomes the call's error.
fn settle<T>(value: T, captured: bool, teardown: Result<(), String>) -> Result<T, BridgeError> {
    match teardown {
        Ok(()) => Ok(value),
        Err(err) if captured => {
            warn!(error = %err, "MCP session cleanup failed (data received OK)");
            Ok(value)
        }
        Err(err) => Err(BridgeError::mcp(err)),
    }
}

#[async_trait]
impl SpacesUpstream for SpacesClient {
    async fn list_spaces(&self) -> Result<Vec<Value>, BridgeError> {
        let outcome = async {
            let exchange = self.call_tool(TOOL_LIST_COPILOT_SPACES, Map::new()).await?;
            let decoded = tool_result::decode_first_item(&exchange.output);
            let spaces = listing::normalize_listing(decoded);
            let captured = !spaces.is_empty();
            settle(spaces, captured, exchange.teardown)
        }
        .await;

        match outcome {
            Ok(spaces) => {
                info!(count = spaces.len(), "Found Copilot Space(s)");
                Ok(spaces)
            }
            Err(err) => {
                error!(error = %err, "Error listing Copilot Spaces via MCP");
                Err(err)
            }
        }
    }

    async fn get_space(&self, space_ref: &str) -> Result<Space, BridgeError> {
        let (owner, name) = fetch::split_space_ref(space_ref);
        let mut arguments = Map::new();
        arguments.insert("owner".to_string(), Value::String(owner.to_string()));
        arguments.insert("name".to_string(), Value::String(name.to_string()));

        let exchange = match self.call_tool(TOOL_GET_COPILOT_SPACE, arguments).await {
            Ok(exchange) => exchange,
            Err(err) => {
                error!(space_ref = %space_ref, error = %err, "Error getting Copilot Space");
                return Err(err);
            }
        };

        let space = fetch::assemble_space(space_ref, &exchange.output);
        info!(
            space_ref = %space_ref,
            "Loaded space: {} file(s), {} chars of context",
            space.files.len(),
            space.context.chars().count()
        );
        settle(space, true, exchange.teardown)
    }

    async fn query_chat(
        &self,
        space_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Value, BridgeError> {
        let credential = self.credential.resolve()?;
        self.completions
            .query_chat(&credential, space_id, messages)
            .await
    }
}
