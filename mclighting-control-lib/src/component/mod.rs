//! Port-based front end for a [`LightSession`].
//!
//! A dataflow graph feeds [`InPacket`]s into [`McLightingComponent::process`]
//! and forwards whatever [`OutPacket`] comes back.

use serde::{Deserialize, Serialize};

use crate::config::ConnectionConfig;
use crate::error::Error;
use crate::session::LightSession;

/// A packet arriving on one of the component's inports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "port", content = "data", rename_all = "lowercase")]
pub enum InPacket {
    /// WebSocket addresses of the lights to control.
    Addresses(Vec<String>),
    /// A command sent to every connected light.
    Command(String),
    /// Bang: fetch and keep the current state of every light.
    Store,
    /// Bang: reapply the last stored state.
    Restore,
}

/// Payload sent on the `error` outport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl From<Error> for ErrorPayload {
    fn from(error: Error) -> Self {
        ErrorPayload {
            message: error.to_string(),
        }
    }
}

/// A packet leaving on one of the component's outports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "port", content = "data", rename_all = "lowercase")]
pub enum OutPacket {
    Out(Vec<String>),
    Error(ErrorPayload),
}

/// Controls McLighting lights through `addresses`, `command`, `store` and
/// `restore` inports and `out` and `error` outports.
#[derive(Debug, Default)]
pub struct McLightingComponent {
    session: LightSession,
}

impl McLightingComponent {
    pub const DESCRIPTION: &'static str = "Control McLighting lights";

    pub fn new(config: ConnectionConfig) -> Self {
        McLightingComponent {
            session: LightSession::new(config),
        }
    }

    pub fn session(&self) -> &LightSession {
        &self.session
    }

    /// Handles one inbound packet.
    ///
    /// Returns `None` when the packet produces no output, which is the case for
    /// anything but `addresses` while no lights are registered.
    pub async fn process(&mut self, packet: InPacket) -> Option<OutPacket> {
        let result = match packet {
            InPacket::Addresses(addresses) => self.session.register(addresses.as_slice()),
            _ if self.session.is_empty() => return None,
            InPacket::Command(command) => self.session.broadcast(&command).await,
            InPacket::Store => self.session.store().await,
            InPacket::Restore => self.session.restore().await,
        };
        Some(Self::respond(result))
    }

    /// Drops all lights and stored state.
    pub fn tear_down(&mut self) {
        self.session.clear();
    }

    fn respond(result: crate::error::Result<Vec<String>>) -> OutPacket {
        match result {
            Ok(out) => OutPacket::Out(out),
            Err(e) => OutPacket::Error(e.into()),
        }
    }
}
