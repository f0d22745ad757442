//! Model Context Protocol on both sides of the bridge: a streamable-HTTP client
//! for GitHub's Copilot Spaces server and the bridge's own MCP server.

pub mod client;
pub mod server;
pub mod transport;

/// Upstream tool listing the Spaces visible to the credential.
pub const TOOL_LIST_COPILOT_SPACES: &str = "list_copilot_spaces";
/// Upstream tool returning one Space with its files as embedded resources.
pub const TOOL_GET_COPILOT_SPACE: &str = "get_copilot_space";
