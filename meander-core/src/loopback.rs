use crate::client::{
    BrokerClient, ClientError, ConnectionConfig, ConnectionHandle, DeliveryObserver, TopicHandle,
};

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// One call made against a [`LoopbackClient`], recorded in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientOp {
    Open(u64),
    Close(u64),
    CreateTopic(String),
    Send { topic: String, bytes: usize },
    Flush(u64),
    DestroyTopic(String),
}

#[derive(Debug, Clone)]
struct LoopbackTopic {
    name: String,
    connection: u64,
    opaque: u64,
}

/// In-process [`BrokerClient`] implementation.
/// SHOULD BE USED ONLY FOR TESTING AND LOCAL RESOLUTION PASSES
///
/// Every queued payload is confirmed back through the registered delivery
/// observer with the topic's opaque value, which exercises the same
/// back-reference path a wire client drives from its internal thread.
/// Failure injection knobs make the error branches of the resolution walk
/// reachable without a broker.
pub struct LoopbackClient {
    next_handle: AtomicU64,
    connections: DashMap<u64, ()>,
    topics: DashMap<u64, LoopbackTopic>,
    ops: Mutex<Vec<ClientOp>>,
    observer: RwLock<Option<Arc<dyn DeliveryObserver>>>,
    open_failure: Mutex<Option<String>>,
    topic_failures: DashMap<String, String>,
    send_failure: Mutex<Option<String>>,
    flush_failure: Mutex<Option<String>>,
}

impl Default for LoopbackClient {
    fn default() -> Self {
        LoopbackClient::new()
    }
}

impl LoopbackClient {
    pub fn new() -> Self {
        LoopbackClient {
            next_handle: AtomicU64::new(1),
            connections: DashMap::new(),
            topics: DashMap::new(),
            ops: Mutex::new(Vec::new()),
            observer: RwLock::new(None),
            open_failure: Mutex::new(None),
            topic_failures: DashMap::new(),
            send_failure: Mutex::new(None),
            flush_failure: Mutex::new(None),
        }
    }

    /// Make every subsequent open call fail with the given cause.
    pub fn fail_opens(&self, cause: &str) {
        if let Ok(mut failure) = self.open_failure.lock() {
            *failure = Some(cause.to_string());
        }
    }

    /// Make topic-handle creation fail for one topic name.
    pub fn fail_topic(&self, topic_name: &str, cause: &str) {
        self.topic_failures
            .insert(topic_name.to_string(), cause.to_string());
    }

    /// Make every subsequent send call fail with the given cause.
    pub fn fail_sends(&self, cause: &str) {
        if let Ok(mut failure) = self.send_failure.lock() {
            *failure = Some(cause.to_string());
        }
    }

    /// Make every subsequent flush call fail with the given cause.
    pub fn fail_flushes(&self, cause: &str) {
        if let Ok(mut failure) = self.flush_failure.lock() {
            *failure = Some(cause.to_string());
        }
    }

    /// All calls made so far, in issue order.
    pub fn op_log(&self) -> Vec<ClientOp> {
        self.ops.lock().map(|ops| ops.clone()).unwrap_or_default()
    }

    /// Number of open calls issued so far.
    pub fn open_calls(&self) -> usize {
        self.op_log()
            .iter()
            .filter(|op| matches!(op, ClientOp::Open(_)))
            .count()
    }

    /// Connections currently open.
    pub fn live_connections(&self) -> usize {
        self.connections.len()
    }

    /// Topic handles currently alive.
    pub fn live_topics(&self) -> usize {
        self.topics.len()
    }

    fn record(&self, op: ClientOp) {
        if let Ok(mut ops) = self.ops.lock() {
            ops.push(op);
        }
    }

    fn injected_failure(&self, slot: &Mutex<Option<String>>) -> Option<String> {
        slot.lock().ok().and_then(|failure| failure.clone())
    }

    fn report_delivery(&self, opaque: u64, result: Result<(), ClientError>) {
        let observer = self.observer.read().ok().and_then(|guard| guard.clone());
        if let Some(observer) = observer {
            observer.on_delivery(opaque, result);
        }
    }
}

#[async_trait]
impl BrokerClient for LoopbackClient {
    fn version(&self) -> String {
        "loopback-client/0.1.0".to_string()
    }

    fn set_delivery_observer(&self, observer: Arc<dyn DeliveryObserver>) {
        if let Ok(mut guard) = self.observer.write() {
            *guard = Some(observer);
        }
    }

    async fn open(&self, config: &ConnectionConfig) -> Result<ConnectionHandle, ClientError> {
        if let Some(cause) = self.injected_failure(&self.open_failure) {
            return Err(ClientError::Open(cause));
        }

        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.connections.insert(handle, ());
        self.record(ClientOp::Open(handle));
        debug!(
            handle,
            brokers = config.get(crate::client::BROKER_LIST).unwrap_or(""),
            "loopback connection opened"
        );
        Ok(ConnectionHandle(handle))
    }

    async fn close(&self, connection: ConnectionHandle) {
        let orphaned = self
            .topics
            .iter()
            .filter(|entry| entry.value().connection == connection.0)
            .count();
        if orphaned > 0 {
            warn!(
                handle = connection.0,
                orphaned, "connection closed with live topic handles"
            );
        }

        self.connections.remove(&connection.0);
        self.record(ClientOp::Close(connection.0));
        debug!(handle = connection.0, "loopback connection closed");
    }

    async fn create_topic_handle(
        &self,
        connection: ConnectionHandle,
        topic_name: &str,
        opaque: u64,
    ) -> Result<TopicHandle, ClientError> {
        if !self.connections.contains_key(&connection.0) {
            return Err(ClientError::UnknownHandle);
        }
        if let Some(cause) = self.topic_failures.get(topic_name) {
            return Err(ClientError::TopicCreate(cause.clone()));
        }

        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.topics.insert(
            handle,
            LoopbackTopic {
                name: topic_name.to_string(),
                connection: connection.0,
                opaque,
            },
        );
        self.record(ClientOp::CreateTopic(topic_name.to_string()));
        Ok(TopicHandle(handle))
    }

    async fn send(&self, topic: TopicHandle, payload: &[u8]) -> Result<(), ClientError> {
        let entry = match self.topics.get(&topic.0) {
            Some(entry) => entry.value().clone(),
            None => return Err(ClientError::UnknownHandle),
        };

        if let Some(cause) = self.injected_failure(&self.send_failure) {
            return Err(ClientError::Send(cause));
        }

        self.record(ClientOp::Send {
            topic: entry.name.clone(),
            bytes: payload.len(),
        });
        self.report_delivery(entry.opaque, Ok(()));
        Ok(())
    }

    async fn flush(
        &self,
        connection: ConnectionHandle,
        _timeout: Duration,
    ) -> Result<(), ClientError> {
        if !self.connections.contains_key(&connection.0) {
            return Err(ClientError::UnknownHandle);
        }
        self.record(ClientOp::Flush(connection.0));

        match self.injected_failure(&self.flush_failure) {
            Some(cause) => Err(ClientError::Flush(cause)),
            None => Ok(()),
        }
    }

    async fn destroy_topic_handle(&self, topic: TopicHandle) {
        if let Some((_, entry)) = self.topics.remove(&topic.0) {
            self.record(ClientOp::DestroyTopic(entry.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_close_lifecycle_recorded() {
        let client = LoopbackClient::new();
        let config = ConnectionConfig::new();

        let connection = client.open(&config).await.unwrap();
        assert_eq!(client.live_connections(), 1);
        assert_eq!(client.open_calls(), 1);

        client.close(connection).await;
        assert_eq!(client.live_connections(), 0);
        assert_eq!(
            client.op_log(),
            vec![ClientOp::Open(connection.0), ClientOp::Close(connection.0)]
        );
    }

    #[tokio::test]
    async fn send_reports_delivery_with_opaque() {
        struct Recorder(Mutex<Vec<u64>>);
        impl DeliveryObserver for Recorder {
            fn on_delivery(&self, opaque: u64, result: Result<(), ClientError>) {
                assert!(result.is_ok());
                self.0.lock().unwrap().push(opaque);
            }
        }

        let client = LoopbackClient::new();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        client.set_delivery_observer(recorder.clone());

        let connection = client.open(&ConnectionConfig::new()).await.unwrap();
        let topic = client
            .create_topic_handle(connection, "orders", 42)
            .await
            .unwrap();
        client.send(topic, b"test").await.unwrap();

        assert_eq!(recorder.0.lock().unwrap().as_slice(), &[42]);

        client.destroy_topic_handle(topic).await;
        client.close(connection).await;
        assert_eq!(client.live_topics(), 0);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_client_errors() {
        let client = LoopbackClient::new();

        client.fail_opens("broker unreachable");
        let err = client.open(&ConnectionConfig::new()).await.unwrap_err();
        assert_eq!(err, ClientError::Open("broker unreachable".to_string()));

        let client = LoopbackClient::new();
        let connection = client.open(&ConnectionConfig::new()).await.unwrap();

        client.fail_topic("orders", "authorization failed");
        let err = client
            .create_topic_handle(connection, "orders", 1)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ClientError::TopicCreate("authorization failed".to_string())
        );

        client.fail_flushes("timed out");
        let err = client
            .flush(connection, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Flush("timed out".to_string()));
    }

    #[tokio::test]
    async fn topic_handle_rejected_for_unknown_connection() {
        let client = LoopbackClient::new();
        let err = client
            .create_topic_handle(ConnectionHandle(99), "orders", 1)
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::UnknownHandle);
    }
}
