//! copilot-spaces-bridge exposes GitHub Copilot Spaces to tools that cannot
//! talk to them directly.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`spaces`] is the upstream client: it lists and fetches Spaces through
//!   GitHub's remote MCP server and forwards grounded questions to the chat
//!   completions endpoint.
//! - [`mcp`] speaks Model Context Protocol on both sides, with a
//!   streamable-HTTP client for the upstream and the bridge's own server over
//!   SSE or stdio.
//! - [`core`] owns configuration, credential lookup, conversation state, and
//!   the question-answering flow shared by both front ends.
//! - [`rest`] serves the JSON API and the static chat UI.
//! - [`api`] defines the chat payloads and the completions client.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which resolves settings and dispatches into
//! [`rest::run`] or one of the MCP server transports.

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod rest;
pub mod spaces;

#[cfg(test)]
pub(crate) mod test_utils;
