use thiserror::Error;

/// Errors surfaced by McLighting connections and sessions.
#[derive(Error, Debug)]
pub enum Error {
    /// A command was sent while no WebSocket connection was open.
    #[error("Not connected to McLighting {0}")]
    NotConnected(String),

    /// The connection dropped before the device replied.
    #[error("Connection to McLighting {0} closed before a reply was received")]
    ConnectionClosed(String),

    /// The device did not reply within the configured timeout.
    #[error("Timed out waiting for a reply from McLighting {0}")]
    ReplyTimeout(String),

    /// The connection gave up reconnecting.
    #[error("Gave up connecting to McLighting {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    /// Restore was requested before any state was captured.
    #[error("No stored modes to restore")]
    NoStoredState,

    /// The status document lacks a field required for restoring.
    #[error("Status of light {index} has no usable {field}")]
    MissingStateField { index: usize, field: &'static str },

    /// A color value could not be understood.
    #[error("Invalid color value: {0}")]
    InvalidColor(String),

    /// An address could not be turned into a WebSocket or HTTP URL.
    #[error("Invalid McLighting address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The status endpoint answered with a non-success code.
    #[error("Failed to fetch status from {url} with status: {status}")]
    StatusCode {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
