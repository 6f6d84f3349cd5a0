//! HTTP client for the MCP tool server.
//!
//! Speaks the same JSON-RPC envelope as the server: `initialize`, then
//! `tools/list` and `tools/call`.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::core::jsonrpc::{RpcError, RpcRequest, RpcResponse};
use crate::core::tool::{CallRequest, CallResult};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/mcp";

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned error: {0}")]
    Rpc(RpcError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_schema: Value,
}

#[derive(Deserialize)]
struct ToolsList {
    tools: Vec<RemoteTool>,
}

pub struct McpClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicI64,
}

impl McpClient {
    pub fn new(endpoint: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mcp-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            next_id: AtomicI64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform the initialize handshake and announce readiness.
    pub async fn initialize(&self) -> ClientResult<Value> {
        let params = serde_json::json!({
            "protocolVersion": crate::core::server::LATEST_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "mcp-cli",
                "version": env!("CARGO_PKG_VERSION")
            }
        });
        let result = self.request("initialize", Some(params)).await?;
        self.notify("notifications/initialized").await?;
        Ok(result)
    }

    pub async fn list_tools(&self) -> ClientResult<Vec<RemoteTool>> {
        let result = self.request("tools/list", None).await?;
        let list: ToolsList = serde_json::from_value(result)?;
        Ok(list.tools)
    }

    pub async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ClientResult<CallResult> {
        let params = serde_json::to_value(CallRequest::new(name, arguments))?;
        let result = self.request("tools/call", Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn request(&self, method: &str, params: Option<Value>) -> ClientResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, endpoint = %self.endpoint, "Sending request");

        let response: RpcResponse = self
            .http
            .post(&self.endpoint)
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(ClientError::Rpc(err));
        }
        response
            .result
            .ok_or_else(|| ClientError::InvalidResponse(format!("{} returned no result", method)))
    }

    async fn notify(&self, method: &str) -> ClientResult<()> {
        self.http
            .post(&self.endpoint)
            .json(&RpcRequest::notification(method))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
