use crate::connection::ClusterConnection;
use crate::errors::{BindError, ProbeError};

use dashmap::DashMap;
use meander_core::{BrokerClient, ClientError, DeliveryObserver, Topic, TopicHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Canary payload sent once per bound topic at resolution time.
pub const PROBE_PAYLOAD: &[u8] = b"test";

/// Upper bound on the probe's delivery flush.
pub const PROBE_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe flush polarity: when true, a flush that reports success is treated
/// as the probe failure branch. See DESIGN.md for the recorded decision.
pub const FLUSH_SUCCESS_IS_PROBE_FAILURE: bool = false;

/// One topic materialized against a live connection.
///
/// The binding is the sole strong owner of its topic handle. The protocol
/// layer never holds the binding itself; delivery confirmations carry the
/// binding's id, resolved through the registry's weak entry only while the
/// binding is alive.
#[derive(Debug)]
pub struct TopicBinding {
    id: u64,
    topic_name: String,
    handle: OnceLock<TopicHandle>,
}

impl TopicBinding {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }
}

/// Resolves delivery-confirmation back-references to live bindings.
#[derive(Default)]
pub struct BindingRegistry {
    next_id: AtomicU64,
    bindings: DashMap<u64, Weak<TopicBinding>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        BindingRegistry::default()
    }

    /// Number of bindings currently registered, live or not yet reaped.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn register(&self, id: u64, binding: Weak<TopicBinding>) {
        self.bindings.insert(id, binding);
    }

    fn unregister(&self, id: u64) {
        self.bindings.remove(&id);
    }

    fn resolve(&self, id: u64) -> Option<Arc<TopicBinding>> {
        self.bindings.get(&id).and_then(|weak| weak.upgrade())
    }
}

impl DeliveryObserver for BindingRegistry {
    fn on_delivery(&self, opaque: u64, result: Result<(), ClientError>) {
        match self.resolve(opaque) {
            Some(binding) => match result {
                Ok(()) => {
                    debug!(topic = %binding.topic_name(), "delivery confirmed")
                }
                Err(err) => {
                    warn!(topic = %binding.topic_name(), error = %err, "delivery failed")
                }
            },
            None => warn!(opaque, "delivery report for a released binding"),
        }
    }
}

/// Creates, probes, and releases topic bindings under an open connection.
#[derive(Clone)]
pub struct TopicBinder {
    client: Arc<dyn BrokerClient>,
    registry: Arc<BindingRegistry>,
}

impl TopicBinder {
    pub fn new(client: Arc<dyn BrokerClient>, registry: Arc<BindingRegistry>) -> Self {
        TopicBinder { client, registry }
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    /// Create a topic handle under the given connection.
    ///
    /// The binding's registry entry is in place before the handle is created,
    /// so a delivery confirmation can resolve it the moment the protocol
    /// layer is able to emit one. If handle creation fails, the entry and the
    /// binding are released before the error is returned.
    pub async fn bind(
        &self,
        connection: &ClusterConnection,
        topic: &Topic,
    ) -> Result<Arc<TopicBinding>, BindError> {
        let id = self.registry.next_id();
        let binding = Arc::new(TopicBinding {
            id,
            topic_name: topic.topic_name.clone(),
            handle: OnceLock::new(),
        });
        self.registry.register(id, Arc::downgrade(&binding));

        match self
            .client
            .create_topic_handle(connection.handle(), &topic.topic_name, id)
            .await
        {
            Ok(handle) => {
                let _ = binding.handle.set(handle);
                debug!(topic = %topic.topic_name, binding = id, "topic bound");
                Ok(binding)
            }
            Err(err) => {
                self.registry.unregister(id);
                Err(BindError {
                    cause: err.to_string(),
                })
            }
        }
    }

    /// Send the canary payload through the binding and flush the owning
    /// connection with a bounded timeout.
    pub async fn probe(
        &self,
        connection: &ClusterConnection,
        binding: &TopicBinding,
    ) -> Result<(), ProbeError> {
        let handle = match binding.handle.get() {
            Some(handle) => *handle,
            None => return Err(ProbeError::Send("topic handle missing".to_string())),
        };

        if let Err(err) = self.client.send(handle, PROBE_PAYLOAD).await {
            error!(topic = %binding.topic_name(), error = %err, "unable to queue probe payload");
            return Err(ProbeError::Send(err.to_string()));
        }

        let flushed = self
            .client
            .flush(connection.handle(), PROBE_FLUSH_TIMEOUT)
            .await;

        match (FLUSH_SUCCESS_IS_PROBE_FAILURE, flushed) {
            (false, Ok(())) => Ok(()),
            (false, Err(err)) => Err(ProbeError::Flush(err.to_string())),
            (true, Ok(())) => Err(ProbeError::Flush("flush reported success".to_string())),
            (true, Err(_)) => Ok(()),
        }
    }

    /// Release a binding: destroy the topic handle first, then drop the
    /// back-reference entry, then the caller's own reference.
    pub async fn release(&self, binding: Arc<TopicBinding>) {
        if let Some(handle) = binding.handle.get() {
            self.client.destroy_topic_handle(*handle).await;
        }
        self.registry.unregister(binding.id);
        debug!(topic = %binding.topic_name(), binding = binding.id, "topic binding released");
        drop(binding);
    }
}
