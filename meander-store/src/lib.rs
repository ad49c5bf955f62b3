mod errors;
pub use errors::Result;
pub use errors::StoreError;

mod store;
pub use store::EntityStore;

mod events;
pub use events::{LogObserver, ObserverBus, ProducerEvent, ProducerObserver};

mod definitions;
pub use definitions::TopologyFile;

mod memory;
pub use memory::MemoryStore;

use async_trait::async_trait;
use meander_core::{Cluster, Consumer, Producer, Topic};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum EntityStorage {
    InMemory(MemoryStore),
    // extension point for persistent backends, like watched config files
}

#[async_trait]
impl EntityStore for EntityStorage {
    async fn clusters(&self) -> Result<Vec<Cluster>> {
        match self {
            EntityStorage::InMemory(store) => store.clusters().await,
        }
    }

    async fn producers(&self) -> Result<Vec<Producer>> {
        match self {
            EntityStorage::InMemory(store) => store.producers().await,
        }
    }

    async fn consumers(&self) -> Result<Vec<Consumer>> {
        match self {
            EntityStorage::InMemory(store) => store.consumers().await,
        }
    }

    async fn topics(&self) -> Result<Vec<Topic>> {
        match self {
            EntityStorage::InMemory(store) => store.topics().await,
        }
    }

    async fn producers_for_cluster(&self, cluster_id: &str) -> Result<Vec<Producer>> {
        match self {
            EntityStorage::InMemory(store) => store.producers_for_cluster(cluster_id).await,
        }
    }

    async fn consumers_for_cluster(&self, cluster_id: &str) -> Result<Vec<Consumer>> {
        match self {
            EntityStorage::InMemory(store) => store.consumers_for_cluster(cluster_id).await,
        }
    }

    async fn topics_for_producer(&self, producer_id: &str) -> Result<Vec<Topic>> {
        match self {
            EntityStorage::InMemory(store) => store.topics_for_producer(producer_id).await,
        }
    }

    async fn topics_for_consumer(&self, consumer_id: &str) -> Result<Vec<Topic>> {
        match self {
            EntityStorage::InMemory(store) => store.topics_for_consumer(consumer_id).await,
        }
    }
}

impl EntityStorage {
    /// The producer lifecycle observer bus fed by this storage backend.
    pub fn observer_bus(&self) -> Arc<ObserverBus> {
        match self {
            EntityStorage::InMemory(store) => store.observer_bus(),
        }
    }
}
