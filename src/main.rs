/// MCP Tool Server Entry Point
///
/// Loads configuration from the environment (see `core::config`), builds the
/// tool registry and dispatcher, then starts the transport selected by
/// MCP_TRANSPORT_MODE.

use std::sync::Arc;

use mcp_tool_server::core::config::{ServerConfig, TransportMode};
use mcp_tool_server::core::server::{self, AppState};
use mcp_tool_server::{init_tracing, tools};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("{}", e);
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    // Registration must complete before any call is accepted; a duplicate
    // tool name is a wiring bug and aborts startup.
    let dispatcher = match tools::build_dispatcher() {
        Ok(dispatcher) => Arc::new(dispatcher),
        Err(e) => {
            error!(error = %e, "Failed to register tools");
            std::process::exit(1);
        }
    };
    let state = AppState::new(&config, dispatcher);

    let result = match config.transport {
        TransportMode::Stdio => tokio::select! {
            result = server::run_server_stdio(state) => result,
            _ = server::shutdown_signal() => Ok(()),
        },
        TransportMode::Http => server::run_server_http(&config, state).await,
        TransportMode::Both => {
            // STDIO in the background, HTTP in the foreground
            let stdio_state = state.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_state).await {
                    error!(error = %e, "STDIO server error");
                }
            });

            let http_result = server::run_server_http(&config, state).await;
            stdio_handle.abort();
            http_result
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server terminated with error");
        std::process::exit(1);
    }
    info!("Shutdown complete");

    // A pending stdin read occupies a blocking thread that runtime teardown
    // would wait on forever.
    std::process::exit(0);
}
