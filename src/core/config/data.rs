use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Transport used by the MCP front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransportMode {
    /// HTTP with a server-sent event stream per client (`GET /sse`).
    #[default]
    Sse,
    /// Newline-delimited JSON-RPC over the process's stdin/stdout.
    Stdio,
}

impl McpTransportMode {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sse" | "http" => Ok(McpTransportMode::Sse),
            "stdio" => Ok(McpTransportMode::Stdio),
            other => Err(format!("Unsupported MCP transport: {}", other)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            McpTransportMode::Sse => "sse",
            McpTransportMode::Stdio => "stdio",
        }
    }
}

/// On-disk configuration. Every field is optional; unset values fall back to
/// environment overrides and then to the built-in defaults.
///
/// The bearer credential is deliberately absent: it is only ever read from the
/// environment.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Remote MCP server exposing the `copilot_spaces` toolset
    pub mcp_url: Option<String>,
    /// OpenAI-compatible chat completions endpoint
    pub chat_url: Option<String>,
    /// Model identifier sent with every chat request
    pub chat_model: Option<String>,
    /// Number of most recent turns forwarded to the chat endpoint
    pub history_limit: Option<usize>,
    /// Port for the REST front end
    pub api_port: Option<u16>,
    /// Port for the MCP front end when it runs over SSE
    pub mcp_port: Option<u16>,
    pub mcp_transport: Option<McpTransportMode>,
    /// Directory holding `index.html` and the static UI assets
    pub ui_dir: Option<PathBuf>,
    /// MCP protocol version requested during initialization
    pub protocol_version: Option<String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/copilot-spaces-bridge/config.toml` → `~/.config/copilot-spaces-bridge/config.toml`
/// - Windows paths are displayed unchanged
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
