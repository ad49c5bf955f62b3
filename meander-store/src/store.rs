use crate::errors::Result;

use async_trait::async_trait;
use meander_core::{Cluster, Consumer, Producer, Topic};

/// Retrieval surface over the persisted topology entities.
///
/// Backends return id-sorted results so that repeated resolution passes over
/// unchanged definitions walk the entities in the same order.
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    /// All defined clusters.
    async fn clusters(&self) -> Result<Vec<Cluster>>;

    /// All defined producers, regardless of cluster.
    async fn producers(&self) -> Result<Vec<Producer>>;

    /// All defined consumers, regardless of cluster.
    async fn consumers(&self) -> Result<Vec<Consumer>>;

    /// All defined topics, regardless of binding.
    async fn topics(&self) -> Result<Vec<Topic>>;

    /// Producers whose cluster reference matches the given id.
    async fn producers_for_cluster(&self, cluster_id: &str) -> Result<Vec<Producer>>;

    /// Consumers whose cluster reference matches the given id.
    async fn consumers_for_cluster(&self, cluster_id: &str) -> Result<Vec<Consumer>>;

    /// Topics whose producer reference matches the given id.
    async fn topics_for_producer(&self, producer_id: &str) -> Result<Vec<Topic>>;

    /// Topics whose consumer reference matches the given id.
    async fn topics_for_consumer(&self, consumer_id: &str) -> Result<Vec<Topic>>;
}
