//! Command-line interface parsing and handling
//!
//! Parses arguments, layers them over the configuration file and environment,
//! and starts the requested front end or one-shot command.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use crate::core::config::{Config, McpTransportMode, Settings};
use crate::core::conversation::ConversationStore;
use crate::core::space_chat::SpaceChat;
use crate::error::BridgeError;
use crate::mcp::server::{sse, stdio, McpServer};
use crate::spaces::{SpacesClient, SpacesUpstream};
use crate::{logging, rest};


#[derive(Parser, Debug)]
#[command(name = "copilot-spaces-bridge", version)]
#[command(about = "Expose GitHub Copilot Spaces through a REST API and an MCP server")]
#[command(
    long_about = "Bridges GitHub Copilot Spaces to two front ends: a REST API that also serves \
a chat UI, and a Model Context Protocol server for tool-capable clients. Spaces are listed and \
fetched through GitHub's remote MCP server; questions are answered by an OpenAI-compatible chat \
completions endpoint grounded in the Space's files.\n\n\
Environment Variables (a .env file in the working directory is loaded first):\n\
  GITHUB_TOKEN                 GitHub PAT with 'copilot' scope (required)\n\
  API_BRIDGE_PORT              REST port (default 3002)\n\
  MCP_SERVER_PORT              MCP SSE port (default 3001)\n\
  MCP_TRANSPORT                MCP transport: sse or stdio (default sse)\n\
  COPILOT_SPACES_MCP_URL       Remote MCP endpoint\n\
  COPILOT_SPACES_CHAT_URL      Chat completions endpoint\n\
  COPILOT_SPACES_CHAT_MODEL    Chat model (default gpt-4o)\n\
  COPILOT_SPACES_UI_DIR        UI directory (default ./ui)\n\
  RUST_LOG                     Log filter (default info)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the REST API bridge and UI server (default)
    Api {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory with index.html and static UI assets
        #[arg(long, value_name = "DIR")]
        ui_dir: Option<PathBuf>,
    },
    /// Run the MCP server
    Mcp {
        /// Transport to serve: sse or stdio
        #[arg(short, long, value_parser = McpTransportMode::parse)]
        transport: Option<McpTransportMode>,
        /// Port for the SSE transport
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the Copilot Spaces visible to the token as JSON
    Spaces,
    /// Print one Space, including its files, as JSON
    Space {
        /// Space reference in owner/name form
        space_ref: String,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Api {
            port: None,
            ui_dir: None,
        }
    }
}

/// Command-line values win over the file and environment.
pub fn apply_overrides(settings: &mut Settings, command: &Commands) {
    match command {
        Commands::Api { port, ui_dir } => {
            if let Some(port) = port {
                settings.api_port = *port;
            }
            if let Some(ui_dir) = ui_dir {
                settings.ui_dir = ui_dir.clone();
            }
        }
        Commands::Mcp { transport, port } => {
            if let Some(transport) = transport {
                settings.mcp_transport = *transport;
            }
            if let Some(port) = port {
                settings.mcp_port = *port;
            }
        }
        Commands::Spaces | Commands::Space { .. } => {}
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main(args))?;
    Ok(())
}

async fn async_main(args: Args) -> Result<(), BridgeError> {
    let dotenv = dotenvy::dotenv();
    logging::init();
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "Failed to load .env"),
    }

    let command = args.command.unwrap_or_default();
    let config = Config::load(args.config.as_deref())?;
    let mut settings = config.resolve_from_env()?;
    apply_overrides(&mut settings, &command);

    let upstream = Arc::new(SpacesClient::from_settings(&settings)?);

    match command {
        Commands::Api { .. } => {
            info!(
                port = settings.api_port,
                mcp_url = %settings.mcp_url,
                chat_model = %settings.chat_model,
                "Starting API bridge"
            );
            rest::run(settings.api_port, &settings.ui_dir, build_chat(upstream, &settings)).await
        }
        Commands::Mcp { .. } => {
            info!(
                transport = settings.mcp_transport.as_str(),
                port = settings.mcp_port,
                "Starting MCP server"
            );
            let server = McpServer::new(build_chat(upstream, &settings));
            match settings.mcp_transport {
                McpTransportMode::Sse => sse::run(settings.mcp_port, server).await,
                McpTransportMode::Stdio => stdio::run(server).await,
            }
        }
        Commands::Spaces => {
            let spaces = upstream.list_spaces().await?;
            println!("{}", serde_json::to_string_pretty(&spaces)?);
            Ok(())
        }
        Commands::Space { space_ref } => {
            let space = upstream.get_space(&space_ref).await?;
            println!("{}", serde_json::to_string_pretty(&space)?);
            Ok(())
        }
    }
}

fn build_chat(upstream: Arc<SpacesClient>, settings: &Settings) -> Arc<SpaceChat> {
    Arc::new(SpaceChat::new(
        upstream,
        Arc::new(ConversationStore::new()),
        settings.history_limit,
    ))
}
