//! Common test utilities and fixtures
//!
//! Shared infrastructure for the binary-level tests: an isolated
//! command builder, temporary config files and scripted fake peers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::net::TcpListener as StdTcpListener;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use axum::extract::Query;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

/// A `fleetwatch` command that cannot pick up the developer's own
/// configuration or environment overrides
pub fn fleetwatch_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fleetwatch").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("FLEETWATCH_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

/// Temporary directory holding a config file
pub struct ConfigFixture {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
}

impl ConfigFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        Self {
            temp_dir,
            config_path,
        }
    }

    pub fn with_content(content: &str) -> Self {
        let fixture = Self::new();
        fixture.write_config(content);
        fixture
    }

    pub fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).unwrap();
    }

    pub fn path(&self) -> &str {
        self.config_path.to_str().unwrap()
    }

    pub fn home(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn cmd(&self) -> Command {
        fleetwatch_cmd(self.home())
    }
}

// ─────────────────────────────────────────────────────────────────
// Fake Peers
// ─────────────────────────────────────────────────────────────────

/// What a fake peer answers
#[derive(Clone)]
pub struct FakePeer {
    pub agent_id: String,
    pub name: String,
    pub domain: String,
    pub exchanges: Vec<Value>,
    pub tasks: Vec<Value>,
}

impl FakePeer {
    pub fn new(agent_id: &str, name: &str, domain: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            name: name.to_string(),
            domain: domain.to_string(),
            exchanges: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn with_exchange(mut self, request_id: &str, sender: &str, receiver: &str) -> Self {
        self.exchanges.push(json!({
            "request_id": request_id,
            "sender_agent_id": sender,
            "receiver_agent_id": receiver,
            "domain": self.domain,
            "query": "What changed in the quarterly figures?",
            "confidence": 0.82,
            "timestamp": "2025-03-01T10:00:00"
        }));
        self
    }

    pub fn with_task(mut self, id: &str, state: &str) -> Self {
        self.tasks.push(json!({
            "id": id,
            "status": {"state": state, "timestamp": "2025-03-01T10:05:00Z"},
            "history": [
                {"role": "ROLE_USER", "parts": [{"text": "Summarize the report"}]}
            ]
        }));
        self
    }

    fn router(self) -> Router {
        let health = json!({
            "status": "healthy",
            "agent_id": self.agent_id,
            "agent_name": self.name,
            "domain": self.domain,
            "timestamp": "2025-03-01T10:00:00"
        });
        let exchanges = self.exchanges;
        let tasks = self.tasks;

        Router::new()
            .route("/health", get(move || async move { Json(health) }))
            .route(
                "/api/v1/kep/history",
                get(move |Query(_): Query<HashMap<String, String>>| async move {
                    Json(json!({ "exchanges": exchanges }))
                }),
            )
            .route(
                "/a2a",
                post(move |Json(request): Json<Value>| async move {
                    Json(json!({
                        "jsonrpc": "2.0",
                        "id": request["id"],
                        "result": { "tasks": tasks }
                    }))
                }),
            )
    }

    /// Serve on an ephemeral port for the rest of the test process
    pub fn spawn(self) -> String {
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, router).await.unwrap();
            });
        });

        format!("http://{}", addr)
    }
}

/// An address nothing listens on
pub fn dead_address() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
