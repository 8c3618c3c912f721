//! # McLighting Control Library
//!
//! `mclighting-control-lib` is a Rust library for controlling LED strips running the
//! McLighting firmware. Lights are driven over their WebSocket text interface, and
//! their current state is read from the HTTP `/status` endpoint.
//!
//! The library is meant for tools that control several lights together: a
//! [`session::LightSession`] fans commands out to a set of lights and can capture
//! their state and put it back later. The [`component`] module wraps a session
//! behind the named ports of a dataflow component.
//!
//! ## Features
//!
//! - One self-healing WebSocket per light, with a configurable reconnect policy
//! - Broadcasting raw or typed commands to every light
//! - Capturing color, effect, speed and brightness, and restoring them later
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use mclighting_control_lib::config::ConnectionConfig;
//! use mclighting_control_lib::session::LightSession;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = LightSession::new(ConnectionConfig::default());
//!     session.register(&["ws://192.168.1.40:81", "ws://192.168.1.41:81"])?;
//!     session.wait_connected(Duration::from_secs(5)).await?;
//!
//!     session.store().await?;
//!     session.broadcast("#FF0000").await?;
//!     session.restore().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Disclaimer
//!
//! This project is not affiliated with the McLighting project.
//!
//! ## License
//!
//! This project is dual-licensed under the MIT License and the Apache License, Version 2.0.

// The `config` module holds the reconnect policy and the per-connection settings.
pub mod config;

// The `control_interface` module provides the connection to a single light:
// sending text commands over its WebSocket and fetching its status document.
//
// Example usage:
//
// ```
// use mclighting_control_lib::control_interface::ControlInterface;
// use mclighting_control_lib::config::ConnectionConfig;
//
// let light = ControlInterface::connect("ws://192.168.1.40:81", &ConnectionConfig::default())?;
// let reply = light.send("%128").await?;
// ```
pub mod control_interface;

// The `led` module contains the color model and the typed view of a captured light state.
pub mod led;

pub mod component;
pub mod error;
pub mod session;

// The `util` module provides address handling and the fan-out helpers shared by sessions.
pub mod util;

pub use error::{Error, Result};
