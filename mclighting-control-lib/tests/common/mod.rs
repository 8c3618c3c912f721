#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use mclighting_control_lib::config::{ConnectionConfig, ReconnectPolicy};
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Clone)]
struct MockState {
    name: String,
    commands: Arc<Mutex<Vec<String>>>,
    status: Option<Arc<Value>>,
}

/// An in-process stand-in for a McLighting device.
///
/// Serves the WebSocket at `/ws` and the status document at `/status` on the
/// same port. Every text command is recorded and answered with `<name>: <command>`.
pub struct MockLight {
    pub addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
}

impl MockLight {
    /// Starts a light whose `/status` returns `status`, or HTTP 500 when `None`.
    pub async fn start(name: &str, status: Option<Value>) -> MockLight {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(listener, name, status)
    }

    /// Starts a light on a specific address.
    pub async fn start_on(addr: SocketAddr, name: &str, status: Option<Value>) -> MockLight {
        let listener = TcpListener::bind(addr).await.unwrap();
        Self::serve(listener, name, status)
    }

    fn serve(listener: TcpListener, name: &str, status: Option<Value>) -> MockLight {
        let addr = listener.local_addr().unwrap();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            name: name.to_string(),
            commands: commands.clone(),
            status: status.map(Arc::new),
        };
        let app = Router::new()
            .route("/ws", get(upgrade))
            .route("/status", get(status_document))
            .with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        MockLight { addr, commands }
    }

    pub fn address(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<MockState>) -> Response {
    ws.on_upgrade(move |socket| answer(socket, state))
}

async fn answer(mut socket: WebSocket, state: MockState) {
    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(text) = message {
            state.commands.lock().unwrap().push(text.clone());
            let reply = format!("{}: {}", state.name, text);
            if socket.send(Message::Text(reply)).await.is_err() {
                break;
            }
        }
    }
}

async fn status_document(State(state): State<MockState>) -> Result<Json<Value>, StatusCode> {
    match &state.status {
        Some(status) => Ok(Json(status.as_ref().clone())),
        None => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Settings for talking to [`MockLight`]s: status on the WebSocket port, fast retries.
pub fn test_config() -> ConnectionConfig {
    ConnectionConfig {
        reconnect: ReconnectPolicy {
            interval: Duration::from_millis(50),
            max_attempts: None,
        },
        http_port: None,
        reply_timeout: Some(Duration::from_secs(5)),
    }
}

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
