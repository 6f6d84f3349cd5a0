//! MCP tool server accelerator.
//!
//! - [`core`]: tool registry, middleware chain, dispatcher and the JSON-RPC
//!   transport
//! - [`tools`]: the built-in tools (greeter, calculator, user creation)
//! - [`client`]: HTTP client used by the `mcp-cli` binary

pub mod client;
pub mod core;
pub mod tools;

/// Install the global tracing subscriber.
///
/// Logs go to stderr so the STDIO transport's stdout carries only protocol
/// messages. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() -> Result<(), String> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| format!("Failed to set tracing subscriber: {}", e))
}
