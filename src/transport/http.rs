//! HTTP transport over reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::{Error, Result};
use crate::protocol::{
    ExchangeEntry, HealthReport, HistoryPayload, JsonRpcRequest, JsonRpcResponse, TaskEntry,
    TaskListPayload,
};

use super::{PeerTransport, TransportError, TransportResult};

/// Path of the health endpoint
pub const HEALTH_PATH: &str = "/health";

/// Path of the exchange history endpoint
pub const HISTORY_PATH: &str = "/api/v1/kep/history";

/// Path of the JSON-RPC task registry endpoint
pub const RPC_PATH: &str = "/a2a";

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

/// Settings for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// TCP connect timeout (ms)
    pub connect_timeout_ms: u64,

    /// User-Agent header
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 2000,
            user_agent: crate::version::build_info().user_agent(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// HTTP Transport
// ─────────────────────────────────────────────────────────────────

/// Production transport; one shared connection pool for all peers
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport with the given settings
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn url(address: &str, path: &str) -> String {
        format!("{}{}", address.trim_end_matches('/'), path)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> TransportResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(request_error)?;
        serde_json::from_slice(&body).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

fn request_error(e: reqwest::Error) -> TransportError {
    if e.is_connect() {
        TransportError::Request(format!("connection failed: {}", e))
    } else {
        TransportError::Request(e.to_string())
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn health(&self, address: &str) -> TransportResult<HealthReport> {
        let url = Self::url(address, HEALTH_PATH);
        trace!(url = %url, "Probing peer");

        let response = self.client.get(&url).send().await.map_err(request_error)?;
        let body: serde_json::Value = Self::read_json(response).await?;
        if !body.is_object() {
            return Err(TransportError::Malformed("health body is not an object".into()));
        }
        serde_json::from_value(body).map_err(|e| TransportError::Malformed(e.to_string()))
    }

    async fn exchange_history(
        &self,
        address: &str,
        limit: usize,
    ) -> TransportResult<Vec<ExchangeEntry>> {
        let url = Self::url(address, HISTORY_PATH);
        trace!(url = %url, limit, "Fetching exchange history");

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(request_error)?;

        let payload: HistoryPayload = Self::read_json(response).await?;
        Ok(payload.into_entries())
    }

    async fn list_tasks(&self, address: &str, limit: usize) -> TransportResult<Vec<TaskEntry>> {
        let url = Self::url(address, RPC_PATH);
        let request = JsonRpcRequest::list_tasks(limit);
        trace!(url = %url, id = %request.id, "Listing tasks");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        let rpc: JsonRpcResponse = Self::read_json(response).await?;
        if let Some(err) = rpc.error {
            return Err(TransportError::Rpc {
                code: err.code,
                message: err.message.unwrap_or_default(),
            });
        }

        let result = rpc
            .result
            .ok_or_else(|| TransportError::Malformed("response has no result".into()))?;
        let payload: TaskListPayload =
            serde_json::from_value(result).map_err(|e| TransportError::Malformed(e.to_string()))?;

        Ok(payload.into_entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(HttpTransportConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let router = Router::new().route(
            "/health",
            get(|| async {
                Json(json!({
                    "status": "healthy",
                    "agent_id": "agent-beta-aiml",
                    "agent_name": "AI/ML Research Agent",
                    "domain": "artificial-intelligence",
                    "timestamp": "2025-03-01T10:00:00"
                }))
            }),
        );
        let address = serve(router).await;

        let report = transport().health(&address).await.unwrap();
        assert_eq!(report.agent_id.as_deref(), Some("agent-beta-aiml"));
        assert_eq!(report.domain.as_deref(), Some("artificial-intelligence"));
    }

    #[tokio::test]
    async fn test_health_non_success() {
        let router = Router::new().route(
            "/health",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "starting") }),
        );
        let address = serve(router).await;

        let err = transport().health(&address).await.unwrap_err();
        assert_eq!(err, TransportError::Status(503));
    }

    #[tokio::test]
    async fn test_health_malformed() {
        let router = Router::new().route("/health", get(|| async { "OK" }));
        let address = serve(router).await;

        let err = transport().health(&address).await.unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport()
            .health(&format!("http://{}", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }

    #[tokio::test]
    async fn test_history_passes_limit() {
        let router = Router::new().route(
            "/api/v1/kep/history",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(0);
                let exchanges: Vec<Value> = (0..limit)
                    .map(|i| json!({"request_id": format!("r{}", i), "sender_agent_id": "dkmes-alpha"}))
                    .collect();
                Json(json!({ "exchanges": exchanges }))
            }),
        );
        let address = serve(router).await;

        let entries = transport().exchange_history(&address, 3).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].request_id.as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_list_tasks() {
        let router = Router::new().route(
            "/a2a",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["method"], "tasks/list");
                Json(json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "result": {"tasks": [{
                        "id": "task-1",
                        "status": {"state": "TASK_STATE_COMPLETED", "timestamp": 1700000000.0},
                        "history": []
                    }]}
                }))
            }),
        );
        let address = serve(router).await;

        let tasks = transport().list_tasks(&address, 10).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id.as_deref(), Some("task-1"));
    }

    #[tokio::test]
    async fn test_list_tasks_rpc_error() {
        let router = Router::new().route(
            "/a2a",
            post(|| async {
                Json(json!({
                    "jsonrpc": "2.0",
                    "id": "1",
                    "error": {"code": -32601, "message": "Method not found"}
                }))
            }),
        );
        let address = serve(router).await;

        let err = transport().list_tasks(&address, 10).await.unwrap_err();
        assert_eq!(
            err,
            TransportError::Rpc {
                code: -32601,
                message: "Method not found".into()
            }
        );
    }
}
