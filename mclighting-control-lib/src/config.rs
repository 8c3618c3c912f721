use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default HTTP port McLighting serves `/status` on.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// How a connection retries after the WebSocket closes or fails to open.
///
/// The interval is fixed; there is no backoff growth. With `max_attempts`
/// unset the loop never gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Time to wait between two connection attempts.
    #[serde(with = "duration_millis")]
    pub interval: Duration,
    /// Consecutive failed attempts after which the connection is marked failed.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            interval: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Returns `true` if another attempt is allowed after `failed` consecutive failures.
    pub fn should_retry(&self, failed: u32) -> bool {
        match self.max_attempts {
            Some(max) => failed < max,
            None => true,
        }
    }
}

/// Settings shared by every connection of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub reconnect: ReconnectPolicy,
    /// Port of the HTTP status endpoint. `None` reuses the port of the WebSocket
    /// address, for firmware builds that serve both from one web server.
    pub http_port: Option<u16>,
    /// Maximum time to wait for a reply to a sent command. `None` waits forever.
    #[serde(with = "option_duration_millis")]
    pub reply_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            reconnect: ReconnectPolicy::default(),
            http_port: Some(DEFAULT_HTTP_PORT),
            reply_timeout: None,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod option_duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|millis| millis.map(Duration::from_millis))
    }
}
