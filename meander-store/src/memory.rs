use crate::{
    definitions::TopologyFile,
    errors::Result,
    events::{LogObserver, ObserverBus, ProducerEvent},
    store::EntityStore,
};

use async_trait::async_trait;
use dashmap::DashMap;
use meander_core::{Cluster, Consumer, Producer, Topic};
use std::sync::Arc;
use tracing::debug;

/// DashMap-backed in-memory entity store.
///
/// Holds the four entity types keyed by id and feeds producer lifecycle
/// events into its observer bus on every mutation. Queries return id-sorted
/// snapshots so repeated resolution passes see a stable order.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    clusters: Arc<DashMap<String, Cluster>>,
    producers: Arc<DashMap<String, Producer>>,
    consumers: Arc<DashMap<String, Consumer>>,
    topics: Arc<DashMap<String, Topic>>,
    bus: Arc<ObserverBus>,
}

impl MemoryStore {
    pub async fn new() -> Result<Self> {
        // the default log listener must be in place before any definitions
        // load, so load-time producer events are observed
        let bus = Arc::new(ObserverBus::new());
        bus.add_listener(Arc::new(LogObserver)).await;

        Ok(MemoryStore {
            clusters: Arc::new(DashMap::new()),
            producers: Arc::new(DashMap::new()),
            consumers: Arc::new(DashMap::new()),
            topics: Arc::new(DashMap::new()),
            bus,
        })
    }

    /// The producer lifecycle observer bus fed by this store.
    pub fn observer_bus(&self) -> Arc<ObserverBus> {
        self.bus.clone()
    }

    pub async fn insert_cluster(&self, cluster: Cluster) {
        debug!(cluster = %cluster.id, brokers = %cluster.brokers, "cluster defined");
        self.clusters.insert(cluster.id.clone(), cluster);
    }

    pub async fn insert_producer(&self, producer: Producer) {
        let replaced = self
            .producers
            .insert(producer.id.clone(), producer.clone())
            .is_some();
        let event = if replaced {
            ProducerEvent::Updated(producer)
        } else {
            ProducerEvent::Created(producer)
        };
        self.bus.notify(event).await;
    }

    pub async fn delete_producer(&self, producer_id: &str) {
        if let Some((_, producer)) = self.producers.remove(producer_id) {
            self.bus.notify(ProducerEvent::Deleted(producer)).await;
        }
    }

    pub async fn insert_consumer(&self, consumer: Consumer) {
        self.consumers.insert(consumer.id.clone(), consumer);
    }

    pub async fn insert_topic(&self, topic: Topic) {
        self.topics.insert(topic.id.clone(), topic);
    }

    /// Apply a full set of topology definitions, then announce the batch.
    pub async fn load(&self, definitions: TopologyFile) -> Result<()> {
        for cluster in definitions.clusters {
            self.insert_cluster(cluster).await;
        }
        for consumer in definitions.consumers {
            self.insert_consumer(consumer).await;
        }
        for topic in definitions.topics {
            self.insert_topic(topic).await;
        }

        let count = definitions.producers.len();
        for producer in definitions.producers {
            self.insert_producer(producer).await;
        }
        self.bus.notify(ProducerEvent::LoadedBatch { count }).await;

        Ok(())
    }

    fn sorted_by_id<T, F>(map: &DashMap<String, T>, filter: F) -> Vec<T>
    where
        T: Clone,
        F: Fn(&T) -> bool,
    {
        let mut entries: Vec<(String, T)> = map
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries.into_iter().map(|(_, value)| value).collect()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn clusters(&self) -> Result<Vec<Cluster>> {
        Ok(Self::sorted_by_id(&self.clusters, |_| true))
    }

    async fn producers(&self) -> Result<Vec<Producer>> {
        Ok(Self::sorted_by_id(&self.producers, |_| true))
    }

    async fn consumers(&self) -> Result<Vec<Consumer>> {
        Ok(Self::sorted_by_id(&self.consumers, |_| true))
    }

    async fn topics(&self) -> Result<Vec<Topic>> {
        Ok(Self::sorted_by_id(&self.topics, |_| true))
    }

    async fn producers_for_cluster(&self, cluster_id: &str) -> Result<Vec<Producer>> {
        Ok(Self::sorted_by_id(&self.producers, |producer| {
            producer.cluster_id == cluster_id
        }))
    }

    async fn consumers_for_cluster(&self, cluster_id: &str) -> Result<Vec<Consumer>> {
        Ok(Self::sorted_by_id(&self.consumers, |consumer| {
            consumer.cluster_id == cluster_id
        }))
    }

    async fn topics_for_producer(&self, producer_id: &str) -> Result<Vec<Topic>> {
        Ok(Self::sorted_by_id(&self.topics, |topic| {
            topic.producer_ref() == Some(producer_id)
        }))
    }

    async fn topics_for_consumer(&self, consumer_id: &str) -> Result<Vec<Topic>> {
        Ok(Self::sorted_by_id(&self.topics, |topic| {
            topic.consumer_ref() == Some(consumer_id)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ProducerObserver;
    use std::sync::Mutex;
    use std::time::Duration;

    fn producer(id: &str, cluster: &str) -> Producer {
        Producer {
            id: id.to_string(),
            cluster_id: cluster.to_string(),
        }
    }

    fn topic(id: &str, name: &str, producer: Option<&str>, consumer: Option<&str>) -> Topic {
        Topic {
            id: id.to_string(),
            topic_name: name.to_string(),
            producer_id: producer.map(str::to_string),
            consumer_id: consumer.map(str::to_string),
        }
    }

    /// Tests filtered retrieval across entity relations
    /// Purpose: validates the cluster -> producer -> topic query path
    /// Expected: only entities matching the reference are returned, id-sorted
    #[tokio::test]
    async fn filtered_queries_follow_references() -> Result<()> {
        let store = MemoryStore::new().await?;
        store.insert_producer(producer("p2", "main")).await;
        store.insert_producer(producer("p1", "main")).await;
        store.insert_producer(producer("p3", "backup")).await;
        store.insert_topic(topic("t1", "orders", Some("p1"), None)).await;
        store.insert_topic(topic("t2", "audit", Some("p1"), Some("c1"))).await;
        store.insert_topic(topic("t3", "events", Some("p3"), None)).await;

        let producers = store.producers_for_cluster("main").await?;
        let ids: Vec<&str> = producers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        let topics = store.topics_for_producer("p1").await?;
        let ids: Vec<&str> = topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);

        let topics = store.topics_for_consumer("c1").await?;
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].topic_name, "audit");

        assert!(store.topics_for_producer("p9").await?.is_empty());
        Ok(())
    }

    /// Tests default listener installation
    /// Purpose: validates the log listener is in place before any load
    /// Expected: a fresh store already has one listener on its bus
    #[tokio::test]
    async fn new_store_installs_default_listener() -> Result<()> {
        let store = MemoryStore::new().await?;
        assert_eq!(store.observer_bus().listener_count().await, 1);
        Ok(())
    }

    struct Collector(Mutex<Vec<String>>);

    impl ProducerObserver for Collector {
        fn on_event(&self, event: &ProducerEvent) {
            self.0.lock().unwrap().push(event.to_string());
        }
    }

    /// Tests producer mutation notifications
    /// Purpose: validates created/updated/deleted/loaded-batch dispatch
    /// Expected: one event per mutation, in mutation order
    #[tokio::test]
    async fn producer_mutations_notify_observers() -> Result<()> {
        let store = MemoryStore::new().await?;
        let collector = Arc::new(Collector(Mutex::new(Vec::new())));
        store.observer_bus().add_listener(collector.clone()).await;

        store.insert_producer(producer("p1", "main")).await;
        store.insert_producer(producer("p1", "backup")).await;
        store.delete_producer("p1").await;
        store.delete_producer("missing").await;

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(
            *collector.0.lock().unwrap(),
            vec![
                "created(p1)".to_string(),
                "updated(p1)".to_string(),
                "deleted(p1)".to_string(),
            ]
        );
        Ok(())
    }

    /// Tests bulk load of a definitions file
    /// Purpose: validates load() populates all types and announces the batch
    /// Expected: entities queryable afterwards, loaded-batch event emitted last
    #[tokio::test]
    async fn load_populates_store_and_announces_batch() -> Result<()> {
        let store = MemoryStore::new().await?;
        let collector = Arc::new(Collector(Mutex::new(Vec::new())));
        store.observer_bus().add_listener(collector.clone()).await;

        let definitions = TopologyFile {
            clusters: vec![Cluster {
                id: "main".to_string(),
                brokers: "b1:9092".to_string(),
                security_protocol: "plaintext".to_string(),
                sasl_mechanism: "PLAIN".to_string(),
                sasl_username: String::new(),
                sasl_password: String::new(),
                client_id: "asterisk".to_string(),
                port: 1883,
                ssl: false,
            }],
            producers: vec![producer("p1", "main")],
            consumers: vec![Consumer {
                id: "c1".to_string(),
                cluster_id: "main".to_string(),
            }],
            topics: vec![topic("t1", "orders", Some("p1"), None)],
        };
        store.load(definitions).await?;

        assert_eq!(store.clusters().await?.len(), 1);
        assert_eq!(store.consumers().await?.len(), 1);
        assert_eq!(store.topics().await?.len(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            *collector.0.lock().unwrap(),
            vec!["created(p1)".to_string(), "loaded-batch(1)".to_string()]
        );
        Ok(())
    }
}
