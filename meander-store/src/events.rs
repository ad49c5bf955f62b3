use meander_core::Producer;

use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Lifecycle notification for a producer entity.
#[derive(Debug, Clone)]
pub enum ProducerEvent {
    Created(Producer),
    Updated(Producer),
    Deleted(Producer),
    LoadedBatch { count: usize },
}

impl fmt::Display for ProducerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProducerEvent::Created(producer) => write!(f, "created({})", producer.id),
            ProducerEvent::Updated(producer) => write!(f, "updated({})", producer.id),
            ProducerEvent::Deleted(producer) => write!(f, "deleted({})", producer.id),
            ProducerEvent::LoadedBatch { count } => write!(f, "loaded-batch({})", count),
        }
    }
}

/// Listener for producer lifecycle events.
///
/// Listeners run detached from the store's caller, so a slow listener cannot
/// hold up the mutation that triggered the event. Dispatch is fire-and-forget
/// with no retry.
pub trait ProducerObserver: Send + Sync + 'static {
    fn on_event(&self, event: &ProducerEvent);
}

/// Dispatches producer lifecycle events to registered listeners.
#[derive(Debug, Default)]
pub struct ObserverBus {
    listeners: RwLock<Vec<Arc<dyn ProducerObserver>>>,
}

impl fmt::Debug for dyn ProducerObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProducerObserver")
    }
}

impl ObserverBus {
    pub fn new() -> Self {
        ObserverBus::default()
    }

    pub async fn add_listener(&self, listener: Arc<dyn ProducerObserver>) {
        self.listeners.write().await.push(listener);
    }

    pub async fn listener_count(&self) -> usize {
        self.listeners.read().await.len()
    }

    /// Dispatch one event to every registered listener on a detached task.
    pub async fn notify(&self, event: ProducerEvent) {
        let listeners = self.listeners.read().await.clone();
        for listener in listeners {
            let event = event.clone();
            tokio::spawn(async move {
                listener.on_event(&event);
            });
        }
    }
}

/// Default listener: one structured log record per producer event.
#[derive(Debug, Default)]
pub struct LogObserver;

impl ProducerObserver for LogObserver {
    fn on_event(&self, event: &ProducerEvent) {
        match event {
            ProducerEvent::Created(producer) => {
                debug!(producer = %producer.id, cluster = %producer.cluster_id, "producer created")
            }
            ProducerEvent::Updated(producer) => {
                debug!(producer = %producer.id, cluster = %producer.cluster_id, "producer updated")
            }
            ProducerEvent::Deleted(producer) => {
                debug!(producer = %producer.id, "producer deleted")
            }
            ProducerEvent::LoadedBatch { count } => {
                debug!(count, "producers loaded")
            }
        }
    }
}
