use crate::entity::{SaslMechanism, SecurityProtocol};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Configuration property naming the bootstrap broker list.
pub const BROKER_LIST: &str = "metadata.broker.list";
/// Configuration property naming the security protocol.
pub const SECURITY_PROTOCOL: &str = "security.protocol";
/// Configuration property naming the SASL mechanism.
pub const SASL_MECHANISM: &str = "sasl.mechanism";
/// Configuration property naming the SASL username.
pub const SASL_USERNAME: &str = "sasl.username";
/// Configuration property naming the SASL password.
pub const SASL_PASSWORD: &str = "sasl.password";
/// Configuration property naming the client identifier.
pub const CLIENT_ID: &str = "client.id";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("unable to open connection: {0}")]
    Open(String),

    #[error("unable to create topic handle: {0}")]
    TopicCreate(String),

    #[error("unable to send payload: {0}")]
    Send(String),

    #[error("unable to flush connection: {0}")]
    Flush(String),

    #[error("unknown handle")]
    UnknownHandle,
}

/// Handle to one open broker connection, issued by a [`BrokerClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionHandle(pub u64);

/// Handle to one topic created under an open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicHandle(pub u64);

/// Validated, ordered set of connection settings handed to [`BrokerClient::open`].
///
/// Settings are applied one at a time; the first value the client library
/// rejects aborts the build with a cause string, so a partially populated
/// config is never handed to an open call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionConfig {
    settings: Vec<(String, String)>,
}

impl ConnectionConfig {
    pub fn new() -> Self {
        ConnectionConfig::default()
    }

    /// Apply one setting, rejecting values the client library cannot accept.
    pub fn try_set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            BROKER_LIST => {
                if value.is_empty() {
                    return Err("broker list must not be empty".to_string());
                }
            }
            SECURITY_PROTOCOL => {
                value.parse::<SecurityProtocol>()?;
            }
            SASL_MECHANISM => {
                value.parse::<SaslMechanism>()?;
            }
            SASL_USERNAME | SASL_PASSWORD | CLIENT_ID => {}
            other => {
                return Err(format!("unknown configuration property '{}'", other));
            }
        }

        match self.settings.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.settings.push((key.to_string(), value.to_string())),
        }

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Settings in the order they were applied.
    pub fn settings(&self) -> &[(String, String)] {
        &self.settings
    }
}

/// Receiver for asynchronous delivery confirmations.
///
/// The `opaque` value is the back-reference attached to the topic handle at
/// creation time. It may be reported from a client-internal thread, possibly
/// after the issuing binding has been released, so implementations resolve
/// it through a weak lookup rather than holding the binding alive.
pub trait DeliveryObserver: Send + Sync + 'static {
    fn on_delivery(&self, opaque: u64, result: Result<(), ClientError>);
}

/// The broker protocol client seam.
///
/// The resolution engine reaches the wire only through this trait: open and
/// close connections, create and destroy topic handles, send payloads and
/// flush with a bounded timeout. A production implementation wraps the real
/// protocol library; [`crate::LoopbackClient`] is the in-process stand-in.
#[async_trait]
pub trait BrokerClient: Send + Sync + 'static {
    /// Version string of the underlying protocol library.
    fn version(&self) -> String;

    /// Register the receiver for delivery confirmations.
    fn set_delivery_observer(&self, observer: Arc<dyn DeliveryObserver>);

    /// Open a producer-mode connection with the given configuration.
    async fn open(&self, config: &ConnectionConfig) -> Result<ConnectionHandle, ClientError>;

    /// Close a connection previously returned by [`BrokerClient::open`].
    async fn close(&self, connection: ConnectionHandle);

    /// Create a topic handle under an open connection. The `opaque` value is
    /// returned verbatim with every delivery confirmation for this topic.
    async fn create_topic_handle(
        &self,
        connection: ConnectionHandle,
        topic_name: &str,
        opaque: u64,
    ) -> Result<TopicHandle, ClientError>;

    /// Queue one payload on a topic handle.
    async fn send(&self, topic: TopicHandle, payload: &[u8]) -> Result<(), ClientError>;

    /// Block until queued payloads are delivered or the timeout elapses.
    async fn flush(&self, connection: ConnectionHandle, timeout: Duration)
        -> Result<(), ClientError>;

    /// Destroy a topic handle. Must be called before the owning connection closes.
    async fn destroy_topic_handle(&self, topic: TopicHandle);
}
