//! Error type shared by the upstream client and both front ends.

use crate::core::config::ConfigError;

/// Failures surfaced by the upstream client.
///
/// Front ends never see transport details beyond the rendered message: the
/// REST layer maps every variant to `500 {"detail": ...}` and the MCP layer to
/// an `{"error": ...}` tool payload.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The bearer credential is not present in the environment.
    #[error("{var} environment variable is not set. Create a GitHub PAT with 'copilot' scope.")]
    MissingCredential { var: String },

    /// Session negotiation, JSON-RPC errors, or teardown failures against the
    /// remote MCP server.
    #[error("MCP request failed: {0}")]
    Mcp(String),

    /// The chat completions endpoint answered with a non-success status.
    #[error("Chat completions request failed with status {status}: {summary}")]
    ChatStatus { status: u16, summary: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub(crate) fn mcp(message: impl Into<String>) -> Self {
        BridgeError::Mcp(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_the_variable() {
        let err = BridgeError::MissingCredential {
            var: "GITHUB_TOKEN".to_string(),
        };
        assert!(err.to_string().starts_with("GITHUB_TOKEN environment variable"));
    }

    #[test]
    fn chat_status_renders_status_and_summary() {
        let err = BridgeError::ChatStatus {
            status: 401,
            summary: "Bad credentials".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Chat completions request failed with status 401: Bad credentials"
        );
    }
}
