use url::Url;

use crate::error::{Error, Result};

const STATUS_PATH: &str = "/status";

/// Parses a McLighting WebSocket address.
///
/// Bare `host[:port]` strings are accepted and treated as `ws://host[:port]`.
pub fn websocket_url(address: &str) -> Result<Url> {
    let url = if address.contains("://") {
        Url::parse(address)?
    } else {
        Url::parse(&format!("ws://{}", address))?
    };

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(Error::InvalidAddress {
                address: address.to_string(),
                reason: format!("unsupported scheme {}", other),
            })
        }
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidAddress {
            address: address.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

/// Derives the HTTP status URL of a device from its WebSocket address.
///
/// The host is kept and the path becomes `/status`. The port is replaced by
/// `http_port` when given, otherwise the WebSocket port is kept.
pub fn status_url(address: &Url, http_port: Option<u16>) -> Result<Url> {
    let invalid = |reason: &str| Error::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let mut url = address.clone();
    url.set_scheme("http")
        .map_err(|_| invalid("cannot switch to http"))?;
    if let Some(port) = http_port {
        url.set_port(Some(port))
            .map_err(|_| invalid("cannot set http port"))?;
    }
    url.set_path(STATUS_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
