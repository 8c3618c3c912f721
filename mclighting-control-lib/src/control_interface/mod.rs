use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use derivative::Derivative;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::config::{ConnectionConfig, ReconnectPolicy};
use crate::error::{Error, Result};
use crate::util::address::{status_url, websocket_url};

pub mod command;

use command::LightCommand;

/// Lifecycle of the WebSocket behind a [`ControlInterface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// The first connection attempt is in flight.
    Connecting,
    Connected,
    /// Waiting to retry. `failures` counts failed attempts since the last successful connection.
    Reconnecting { failures: u32 },
    /// The reconnect policy ran out of attempts; the connection is never retried again.
    Failed { reason: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ConnectionState::Failed { .. })
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "CONNECTING"),
            ConnectionState::Connected => write!(f, "CONNECTED"),
            ConnectionState::Reconnecting { failures } => {
                write!(f, "RECONNECTING ({} failed attempts)", failures)
            }
            ConnectionState::Failed { reason } => write!(f, "FAILED ({})", reason),
        }
    }
}

/// A command waiting to be written, with the slot its reply goes to.
struct Outgoing {
    payload: String,
    reply: oneshot::Sender<String>,
}

type Handle = Arc<Mutex<Option<mpsc::UnboundedSender<Outgoing>>>>;
type DeviceStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A connection to a single McLighting device.
///
/// Creating one spawns a background task that opens the WebSocket and keeps
/// reopening it according to the [`ReconnectPolicy`]. Dropping it stops that task.
/// Must be created from within a tokio runtime.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ControlInterface {
    pub address: String,
    url: Url,
    status_url: Url,
    reply_timeout: Option<Duration>,
    #[derivative(Debug = "ignore")]
    client: Client,
    #[derivative(Debug = "ignore")]
    handle: Handle,
    state: watch::Receiver<ConnectionState>,
    #[derivative(Debug = "ignore")]
    task: JoinHandle<()>,
}

impl ControlInterface {
    pub fn connect(address: &str, config: &ConnectionConfig) -> Result<Self> {
        ControlInterface::connect_with_client(address, config, Client::new())
    }

    /// Like [`ControlInterface::connect`], reusing an existing HTTP client for status requests.
    pub fn connect_with_client(
        address: &str,
        config: &ConnectionConfig,
        client: Client,
    ) -> Result<Self> {
        let url = websocket_url(address)?;
        let status_url = status_url(&url, config.http_port)?;

        let handle: Handle = Arc::new(Mutex::new(None));
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);
        let task = tokio::spawn(run_connection(
            address.to_string(),
            url.clone(),
            config.reconnect,
            handle.clone(),
            state_tx,
        ));

        Ok(ControlInterface {
            address: address.to_string(),
            url,
            status_url,
            reply_timeout: config.reply_timeout,
            client,
            handle,
            state,
            task,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status_url(&self) -> &Url {
        &self.status_url
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.current_handle().is_some()
    }

    /// Waits until the WebSocket is open.
    ///
    /// Fails with [`Error::NotConnected`] if `limit` elapses first, or with
    /// [`Error::ConnectionFailed`] if the reconnect policy gave up.
    pub async fn wait_connected(&self, limit: Duration) -> Result<()> {
        let mut state = self.state.clone();
        let outcome = timeout(
            limit,
            state.wait_for(|current| current.is_connected() || current.is_failed()),
        )
        .await;

        match outcome {
            Err(_) => Err(Error::NotConnected(self.address.clone())),
            Ok(Err(_)) => Err(Error::ConnectionClosed(self.address.clone())),
            Ok(Ok(current)) => match &*current {
                ConnectionState::Failed { reason } => Err(Error::ConnectionFailed {
                    address: self.address.clone(),
                    reason: reason.clone(),
                }),
                _ => Ok(()),
            },
        }
    }

    /// Sends a raw text command and waits for the device's reply.
    ///
    /// Fails straight away with [`Error::NotConnected`] if the WebSocket is not
    /// open; the command is not queued for a later connection.
    pub async fn send(&self, payload: impl Into<String>) -> Result<String> {
        let payload = payload.into();
        let sender = self
            .current_handle()
            .ok_or_else(|| Error::NotConnected(self.address.clone()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        debug!("Sending {} to {}", payload, self.address);
        sender
            .send(Outgoing {
                payload,
                reply: reply_tx,
            })
            .map_err(|_| Error::NotConnected(self.address.clone()))?;

        let reply = match self.reply_timeout {
            Some(limit) => timeout(limit, reply_rx)
                .await
                .map_err(|_| Error::ReplyTimeout(self.address.clone()))?,
            None => reply_rx.await,
        };
        reply.map_err(|_| Error::ConnectionClosed(self.address.clone()))
    }

    pub async fn send_command(&self, command: &LightCommand) -> Result<String> {
        self.send(command.to_string()).await
    }

    /// Fetches the device's `/status` document.
    pub async fn status(&self) -> Result<Value> {
        let response = self.client.get(self.status_url.clone()).send().await?;

        if response.status() != StatusCode::OK {
            return Err(Error::StatusCode {
                url: self.status_url.to_string(),
                status: response.status(),
            });
        }
        Ok(response.json::<Value>().await?)
    }

    fn current_handle(&self) -> Option<mpsc::UnboundedSender<Outgoing>> {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for ControlInterface {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn set_handle(handle: &Handle, value: Option<mpsc::UnboundedSender<Outgoing>>) {
    *handle.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

async fn run_connection(
    address: String,
    url: Url,
    policy: ReconnectPolicy,
    handle: Handle,
    state: watch::Sender<ConnectionState>,
) {
    let mut failures = 0u32;
    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _response)) => {
                failures = 0;
                info!("Connected to {}", address);

                let (tx, rx) = mpsc::unbounded_channel();
                set_handle(&handle, Some(tx));
                state.send_replace(ConnectionState::Connected);

                let reason = drive(stream, rx, &address).await;
                set_handle(&handle, None);
                warn!("Connection to {} lost: {}", address, reason);
            }
            Err(e) => {
                failures += 1;
                debug!(
                    "Failed to connect to {} (attempt {}): {}",
                    address, failures, e
                );
                if !policy.should_retry(failures) {
                    let reason = format!("{} failed attempts, last error: {}", failures, e);
                    warn!("Giving up on {}: {}", address, reason);
                    state.send_replace(ConnectionState::Failed { reason });
                    return;
                }
            }
        }

        state.send_replace(ConnectionState::Reconnecting { failures });
        sleep(policy.interval).await;
    }
}

/// Pumps one open WebSocket until it closes, returning why it stopped.
///
/// Replies are matched to commands in the order the commands were written.
async fn drive(
    stream: DeviceStream,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    address: &str,
) -> String {
    let (mut write, mut read) = stream.split();
    let mut pending: VecDeque<oneshot::Sender<String>> = VecDeque::new();

    loop {
        tokio::select! {
            command = outgoing.recv() => {
                let Some(Outgoing { payload, reply }) = command else {
                    return "command channel closed".to_string();
                };
                if let Err(e) = write.send(Message::Text(payload)).await {
                    return format!("write failed: {}", e);
                }
                pending.push_back(reply);
            }
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => match pending.pop_front() {
                    Some(reply) => {
                        debug!("Reply from {}: {}", address, text);
                        // The sender may have timed out and gone away.
                        let _ = reply.send(text);
                    }
                    None => debug!("Unsolicited message from {}: {}", address, text),
                },
                Some(Ok(Message::Close(_))) => return "closed by device".to_string(),
                Some(Ok(_)) => {}
                Some(Err(e)) => return format!("read failed: {}", e),
                None => return "stream ended".to_string(),
            },
        }
    }
}
