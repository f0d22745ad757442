//! Runtime configuration: an optional TOML file, environment overrides, and
//! command-line overrides, resolved into a single [`Settings`] value.

pub mod data;
pub mod defaults;
pub mod io;


pub use data::{Config, McpTransportMode};
pub use io::ConfigError;

use defaults::*;
use std::path::PathBuf;

/// Fully resolved settings consumed by the upstream client and front ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mcp_url: String,
    pub chat_url: String,
    pub chat_model: String,
    pub history_limit: usize,
    pub api_port: u16,
    pub mcp_port: u16,
    pub mcp_transport: McpTransportMode,
    pub ui_dir: PathBuf,
    pub protocol_version: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mcp_url: DEFAULT_MCP_URL.to_string(),
            chat_url: DEFAULT_CHAT_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            api_port: DEFAULT_API_PORT,
            mcp_port: DEFAULT_MCP_PORT,
            mcp_transport: McpTransportMode::default(),
            ui_dir: PathBuf::from(DEFAULT_UI_DIR),
            protocol_version: None,
        }
    }
}

impl Config {
    /// Resolves the file values against environment overrides.
    ///
    /// `env` is injected so tests can resolve against a fixed map instead of
    /// the process environment.
    pub fn resolve<F>(&self, env: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |var: &str| env(var).filter(|value| !value.trim().is_empty());

        let api_port = match lookup(ENV_API_PORT) {
            Some(value) => parse_port(ENV_API_PORT, &value)?,
            None => self.api_port.unwrap_or(DEFAULT_API_PORT),
        };
        let mcp_port = match lookup(ENV_MCP_PORT) {
            Some(value) => parse_port(ENV_MCP_PORT, &value)?,
            None => self.mcp_port.unwrap_or(DEFAULT_MCP_PORT),
        };
        let mcp_transport = match lookup(ENV_MCP_TRANSPORT) {
            Some(value) => {
                McpTransportMode::parse(&value).map_err(|message| ConfigError::InvalidEnv {
                    var: ENV_MCP_TRANSPORT.to_string(),
                    message,
                })?
            }
            None => self.mcp_transport.unwrap_or_default(),
        };

        Ok(Settings {
            mcp_url: lookup(ENV_MCP_URL)
                .or_else(|| self.mcp_url.clone())
                .unwrap_or_else(|| DEFAULT_MCP_URL.to_string()),
            chat_url: lookup(ENV_CHAT_URL)
                .or_else(|| self.chat_url.clone())
                .unwrap_or_else(|| DEFAULT_CHAT_URL.to_string()),
            chat_model: lookup(ENV_CHAT_MODEL)
                .or_else(|| self.chat_model.clone())
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            history_limit: self
                .history_limit
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_HISTORY_LIMIT),
            api_port,
            mcp_port,
            mcp_transport,
            ui_dir: lookup(ENV_UI_DIR)
                .map(PathBuf::from)
                .or_else(|| self.ui_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UI_DIR)),
            protocol_version: self.protocol_version.clone(),
        })
    }

    /// Resolves against the process environment.
    pub fn resolve_from_env(&self) -> Result<Settings, ConfigError> {
        self.resolve(|var| std::env::var(var).ok())
    }
}

fn parse_port(var: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|err| ConfigError::InvalidEnv {
            var: var.to_string(),
            message: err.to_string(),
        })
}
