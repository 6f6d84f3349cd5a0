/// MCP Server Transport
///
/// Binds the `Dispatcher` to the outside world:
/// - an Actix Web HTTP server accepting JSON-RPC 2.0 on `/mcp` (and `/`)
/// - a line-based STDIO loop for local clients and inspectors
///
/// Both transports share `handle_request`, which implements `initialize`,
/// `ping`, `tools/list` and `tools/call`.

use actix_web::{
    App, HttpResponse, HttpServer, Result,
    dev::Server,
    middleware::{Compress, DefaultHeaders, Logger},
    web,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::core::config::ServerConfig;
use crate::core::dispatcher::Dispatcher;
use crate::core::error::ToolError;
use crate::core::jsonrpc::{
    JSONRPC_VERSION, RpcError, RpcRequest, RpcResponse, error_response, success_response,
};
use crate::core::tool::{CallRequest, CallResult};

pub const LATEST_PROTOCOL_VERSION: &str = "2025-03-26";
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05"];

/// Application state shared across all worker threads.
#[derive(Clone)]
pub struct AppState {
    /// Server name as reported in initialize responses
    pub server_name: String,
    /// Server version as reported in initialize responses
    pub server_version: String,
    pub dispatcher: Arc<Dispatcher>,
    /// Total JSON-RPC requests seen, exposed on `/metrics`
    pub requests: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: &ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            server_name: config.name.clone(),
            server_version: config.version.clone(),
            dispatcher,
            requests: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    #[serde(default)]
    protocol_version: Option<String>,
}

/// Wire form of a tool in `tools/list`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolInfo<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: Value,
}

/// Route a JSON-RPC request to its method handler.
///
/// Returns `None` for notifications, which never get a response.
pub fn handle_request(state: &AppState, req: RpcRequest) -> Option<RpcResponse> {
    state.requests.fetch_add(1, Ordering::Relaxed);

    if req.is_notification() {
        debug!(method = %req.method, "Received notification");
        return None;
    }

    let id = req.id.clone();
    let response = match req.method.as_str() {
        "initialize" => handle_initialize(state, id, req.params),
        "ping" => success_response(id, serde_json::json!({})),
        "tools/list" => handle_tools_list(state, id),
        "tools/call" => handle_tools_call(state, id, req.params),
        other => {
            warn!(method = %other, "Method not found");
            error_response(id, RpcError::method_not_found(other))
        }
    };
    Some(response)
}

fn handle_initialize(state: &AppState, id: Option<Value>, params: Option<Value>) -> RpcResponse {
    let requested = params
        .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok())
        .unwrap_or_default()
        .protocol_version;

    let protocol_version = match requested {
        Some(v) if SUPPORTED_PROTOCOL_VERSIONS.contains(&v.as_str()) => v,
        _ => LATEST_PROTOCOL_VERSION.to_string(),
    };

    success_response(
        id,
        serde_json::json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": state.server_name,
                "version": state.server_version
            }
        }),
    )
}

fn handle_tools_list(state: &AppState, id: Option<Value>) -> RpcResponse {
    let tools: Vec<ToolInfo<'_>> = state
        .dispatcher
        .list_tools()
        .into_iter()
        .map(|d| ToolInfo {
            name: &d.name,
            description: &d.description,
            input_schema: d.input_schema(),
        })
        .collect();

    success_response(id, serde_json::json!({ "tools": tools }))
}

fn handle_tools_call(state: &AppState, id: Option<Value>, params: Option<Value>) -> RpcResponse {
    let Some(params) = params else {
        return error_response(id, RpcError::invalid_params("missing params"));
    };
    let request: CallRequest = match serde_json::from_value(params) {
        Ok(request) => request,
        Err(e) => return error_response(id, RpcError::invalid_params(e)),
    };

    let result = match state.dispatcher.dispatch(&request) {
        Ok(result) => result,
        Err(ToolError::NotFound(name)) => {
            warn!(tool = %name, "Unknown tool requested");
            return error_response(id, RpcError::unknown_tool(&name));
        }
        Err(e) => CallResult::error(format!("Error: {}", e)),
    };

    match serde_json::to_value(&result) {
        Ok(value) => success_response(id, value),
        Err(e) => {
            error!(error = %e, "Failed to encode tool result");
            error_response(id, RpcError::internal_error(e))
        }
    }
}

/// Decode a raw request body and route it.
///
/// Bytes that are not JSON yield a parse error. Well-formed JSON that is not a
/// JSON-RPC 2.0 request yields an invalid request error carrying whatever id
/// could be recovered.
pub fn handle_message(state: &AppState, body: &[u8]) -> Option<RpcResponse> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Parse error");
            return Some(error_response(None, RpcError::parse_error(e)));
        }
    };

    let id = value.get("id").cloned();
    match value.get("jsonrpc").and_then(Value::as_str) {
        Some(JSONRPC_VERSION) => {}
        other => {
            warn!(version = ?other, "Unsupported JSON-RPC version");
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be \"2.0\"")
                    .with_data(serde_json::json!({ "expected": JSONRPC_VERSION })),
            ));
        }
    }

    match serde_json::from_value::<RpcRequest>(value) {
        Ok(req) => handle_request(state, req),
        Err(e) => {
            warn!(error = %e, "Invalid request");
            Some(error_response(id, RpcError::invalid_request(e)))
        }
    }
}

/// Liveness probe for load balancers.
async fn health() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

async fn metrics(state: web::Data<AppState>) -> Result<HttpResponse> {
    let count = state.requests.load(Ordering::Relaxed);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "requests_total": count,
        "tools": state.dispatcher.registry().len(),
        "status": "ok"
    })))
}

/// JSON-RPC endpoint. Notifications are acknowledged with 202 and no body.
async fn mcp_handler(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    match handle_message(&state, &body) {
        Some(response) => Ok(HttpResponse::Ok().json(response)),
        None => Ok(HttpResponse::Accepted().finish()),
    }
}

/// Register all HTTP routes. Expects `web::Data<AppState>` in app data.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/", web::post().to(mcp_handler))
        .route("/", web::get().to(health));
}

/// Bind the HTTP server without starting it.
///
/// Actix's own signal handling is disabled; `serve_until` decides when to stop.
/// Returns the server together with the first bound address.
pub fn bind_http_server(config: &ServerConfig, state: AppState) -> std::io::Result<(Server, SocketAddr)> {
    let bind_addr = config.bind_addr();

    info!(
        name = %config.name,
        version = %config.version,
        bind = %bind_addr,
        workers = config.workers,
        tools = state.dispatcher.registry().len(),
        "MCP server starting (HTTP mode)"
    );

    let data = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            .wrap(Logger::new("%r %s %Dms"))
            .configure(routes)
    })
    .workers(config.workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(config.shutdown_timeout.as_secs())
    .disable_signals()
    .bind(&bind_addr)?;

    let addr = server.addrs().first().copied().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no address bound")
    })?;
    Ok((server.run(), addr))
}

/// Drive `server` until `shutdown` resolves, then stop it gracefully: new
/// connections are refused and in-flight requests get up to the configured
/// shutdown timeout to finish.
pub async fn serve_until<F>(server: Server, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = server.handle();
    let watcher = tokio::spawn(async move {
        shutdown.await;
        info!("Stopping HTTP server, draining in-flight requests");
        handle.stop(true).await;
    });

    let result = server.await;
    watcher.abort();
    match &result {
        Ok(()) => info!("Server stopped"),
        Err(e) => error!(error = %e, "Server stopped with error"),
    }
    result
}

/// Resolve on the first SIGINT or SIGTERM. Both mean a graceful stop.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received"),
        _ = terminate => info!("SIGTERM received"),
    }
}

/// Run the server in HTTP mode until SIGINT or SIGTERM.
pub async fn run_server_http(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let (server, addr) = bind_http_server(config, state)?;
    debug!(addr = %addr, "HTTP listener bound");
    serve_until(server, shutdown_signal()).await
}

/// Run the server in STDIO mode.
///
/// Reads one JSON-RPC message per line from stdin and writes one response per
/// line to stdout. Logging goes to stderr so the protocol stream stays clean.
pub async fn run_server_stdio(state: AppState) -> std::io::Result<()> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

    info!(
        name = %state.server_name,
        version = %state.server_version,
        "MCP server starting (STDIO mode)"
    );

    let mut lines = BufReader::with_capacity(8192, tokio::io::stdin()).lines();
    let mut stdout = BufWriter::with_capacity(8192, tokio::io::stdout());

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = handle_message(&state, line.as_bytes()) else {
            continue;
        };

        let encoded = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Error serializing response");
                continue;
            }
        };

        stdout.write_all(encoded.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("STDIO input closed");
    Ok(())
}
