//! Built-in endpoints and limits used when neither the config file nor the
//! environment provides a value.

/// Remote GitHub MCP server, scoped to the `copilot_spaces` toolset.
pub const DEFAULT_MCP_URL: &str = "https://api.githubcopilot.com/mcp/x/copilot_spaces";

/// GitHub Models inference endpoint; accepts GitHub PATs and speaks the
/// OpenAI chat completions dialect.
pub const DEFAULT_CHAT_URL: &str = "https://models.inference.ai.azure.com/chat/completions";

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

/// Environment variable holding the bearer credential.
pub const CREDENTIAL_ENV_VAR: &str = "GITHUB_TOKEN";

pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const DEFAULT_API_PORT: u16 = 3002;
pub const DEFAULT_MCP_PORT: u16 = 3001;

/// UI directory relative to the working directory.
pub const DEFAULT_UI_DIR: &str = "ui";

pub const ENV_API_PORT: &str = "API_BRIDGE_PORT";
pub const ENV_MCP_PORT: &str = "MCP_SERVER_PORT";
pub const ENV_MCP_TRANSPORT: &str = "MCP_TRANSPORT";
pub const ENV_MCP_URL: &str = "COPILOT_SPACES_MCP_URL";
pub const ENV_CHAT_URL: &str = "COPILOT_SPACES_CHAT_URL";
pub const ENV_CHAT_MODEL: &str = "COPILOT_SPACES_CHAT_MODEL";
pub const ENV_UI_DIR: &str = "COPILOT_SPACES_UI_DIR";
