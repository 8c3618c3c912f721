//! A set of McLighting lights driven together.
//!
//! [`LightSession`] owns the connections and the states captured from them.
//! Every operation runs against all lights at once; results come back in the
//! order the addresses were registered.

use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::control_interface::{ConnectionState, ControlInterface};
use crate::error::{Error, Result};
use crate::led::light_state::LightState;
use crate::util::fan_out::{collect_all, first_error, settle};

/// Reported for every light right after registration.
pub const CONNECTING: &str = "CONNECTING";
/// Reported by restore for a light that has nothing captured.
pub const NO_STATE: &str = "NO STATE";

#[derive(Debug)]
pub struct LightSession {
    config: ConnectionConfig,
    client: Client,
    lights: Vec<ControlInterface>,
    /// Index-aligned with `lights` once a store has run; empty before that.
    states: Vec<Option<Value>>,
}

impl Default for LightSession {
    fn default() -> Self {
        Self::new(ConnectionConfig::default())
    }
}

impl LightSession {
    pub fn new(config: ConnectionConfig) -> Self {
        LightSession {
            config,
            client: Client::new(),
            lights: Vec::new(),
            states: Vec::new(),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn lights(&self) -> &[ControlInterface] {
        &self.lights
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// The states captured by the last store, if any.
    pub fn stored_states(&self) -> &[Option<Value>] {
        &self.states
    }

    pub fn connection_states(&self) -> Vec<ConnectionState> {
        self.lights.iter().map(ControlInterface::state).collect()
    }

    /// Replaces the light set with connections to `addresses`.
    ///
    /// The previous connections are closed and any captured state is forgotten.
    /// All addresses are validated before anything is replaced.
    pub fn register<S: AsRef<str>>(&mut self, addresses: &[S]) -> Result<Vec<String>> {
        let lights = addresses
            .iter()
            .map(|address| {
                ControlInterface::connect_with_client(
                    address.as_ref(),
                    &self.config,
                    self.client.clone(),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        self.lights = lights;
        self.states.clear();
        Ok(self.lights.iter().map(|_| CONNECTING.to_string()).collect())
    }

    /// Forgets every light and captured state.
    pub fn clear(&mut self) {
        self.lights.clear();
        self.states.clear();
    }

    /// Waits for every light to be connected.
    pub async fn wait_connected(&self, limit: Duration) -> Result<()> {
        first_error(self.lights.iter().map(|light| light.wait_connected(limit))).await?;
        Ok(())
    }

    /// Sends `command` to every light; fails with the first error observed.
    ///
    /// Lights after a failing one still receive the command.
    pub async fn broadcast(&self, command: &str) -> Result<Vec<String>> {
        first_error(self.lights.iter().map(|light| light.send(command))).await
    }

    /// Sends `command` to every light and reports each light's outcome.
    pub async fn broadcast_settled(&self, command: &str) -> Vec<Result<String>> {
        collect_all(self.lights.iter().map(|light| light.send(command))).await
    }

    /// Captures the status of every light and returns each as serialized JSON.
    ///
    /// Previously captured state is discarded first. Every status request runs
    /// to completion; the lights that answered keep their capture and the error
    /// of the light that failed first is returned.
    pub async fn store(&mut self) -> Result<Vec<String>> {
        self.states = vec![None; self.lights.len()];

        let (statuses, failure) = settle(self.lights.iter().enumerate().map(
            |(index, light)| async move {
                light.status().await.map_err(|e| {
                    debug!("Failed to store light {} state: {}", index, e);
                    e
                })
            },
        ))
        .await;

        let mut serialized = Vec::with_capacity(statuses.len());
        for (index, status) in statuses.into_iter().enumerate() {
            if let Some(status) = status {
                debug!("Storing light {} state as {}", index, status);
                serialized.push(status.to_string());
                self.states[index] = Some(status);
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(serialized),
        }
    }

    /// Reapplies the states captured by the last [`LightSession::store`].
    ///
    /// Each light with a capture receives color, mode, speed and brightness in
    /// that order and reports the reply to the last one. Lights without a capture
    /// report [`NO_STATE`] and receive nothing. A light that fails does not stop
    /// the others from being restored.
    pub async fn restore(&self) -> Result<Vec<String>> {
        if !self.states.iter().any(Option::is_some) {
            return Err(Error::NoStoredState);
        }

        first_error(
            self.lights
                .iter()
                .enumerate()
                .map(|(index, light)| self.restore_light(index, light)),
        )
        .await
    }

    async fn restore_light(&self, index: usize, light: &ControlInterface) -> Result<String> {
        let Some(status) = self.states.get(index).and_then(Option::as_ref) else {
            return Ok(NO_STATE.to_string());
        };
        debug!("Restoring light {} to state {}", index, status);

        let state = LightState::from_status(index, status)?;
        let mut reply = String::new();
        for command in state.restore_commands() {
            reply = light.send_command(&command).await?;
        }
        Ok(reply)
    }
}
