use crate::binding::{BindingRegistry, TopicBinder};
use crate::config::build_connection_config;
use crate::connection::{ClusterConnection, ConnectionFactory};
use crate::errors::ResolveError;
use crate::report::{ResolutionReport, Role};

use meander_core::{BrokerClient, Cluster, Consumer, Producer, Topic};
use meander_store::{EntityStorage, EntityStore};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Walks the declared topology in dependency order and materializes it
/// against the broker client.
///
/// Resolution is best-effort: every failure is recorded in the report
/// against the entity that caused it and siblings continue to resolve.
pub struct TopologyResolver {
    storage: EntityStorage,
    factory: ConnectionFactory,
    binder: TopicBinder,
}

impl TopologyResolver {
    pub fn new(storage: EntityStorage, client: Arc<dyn BrokerClient>) -> Self {
        let registry = Arc::new(BindingRegistry::new());
        client.set_delivery_observer(registry.clone());

        TopologyResolver {
            storage,
            factory: ConnectionFactory::new(client.clone()),
            binder: TopicBinder::new(client, registry),
        }
    }

    /// Resolve every cluster, then report entities whose references point at
    /// nothing. No ordering is guaranteed across clusters.
    pub async fn resolve_all(&self) -> ResolutionReport {
        let mut report = ResolutionReport::new();

        let clusters = match self.storage.clusters().await {
            Ok(clusters) => clusters,
            Err(err) => {
                error!(error = %err, "unable to retrieve clusters");
                return report;
            }
        };

        for cluster in &clusters {
            self.resolve_cluster(cluster, &mut report).await;
        }

        self.scan_unresolved(&clusters, &mut report).await;

        report
    }

    async fn resolve_cluster(&self, cluster: &Cluster, report: &mut ResolutionReport) {
        debug!(cluster = %cluster.id, "resolving cluster");

        match self.storage.producers_for_cluster(&cluster.id).await {
            Ok(producers) => {
                for producer in &producers {
                    self.resolve_producer(cluster, producer, report).await;
                }
            }
            Err(err) => {
                warn!(cluster = %cluster.id, error = %err, "unable to retrieve producers");
                report.record_failure(
                    Role::Cluster,
                    &cluster.id,
                    ResolveError::Store(err.to_string()),
                );
            }
        }

        match self.storage.consumers_for_cluster(&cluster.id).await {
            Ok(consumers) => {
                for consumer in &consumers {
                    self.resolve_consumer(cluster, consumer, report).await;
                }
            }
            Err(err) => {
                warn!(cluster = %cluster.id, error = %err, "unable to retrieve consumers");
                report.record_failure(
                    Role::Cluster,
                    &cluster.id,
                    ResolveError::Store(err.to_string()),
                );
            }
        }
    }

    async fn resolve_producer(
        &self,
        cluster: &Cluster,
        producer: &Producer,
        report: &mut ResolutionReport,
    ) {
        debug!(producer = %producer.id, cluster = %cluster.id, "resolving producer");

        let topics = match self.storage.topics_for_producer(&producer.id).await {
            Ok(topics) => topics,
            Err(err) => {
                warn!(producer = %producer.id, error = %err, "unable to retrieve topics");
                report.record_failure(
                    Role::Producer,
                    &producer.id,
                    ResolveError::Store(err.to_string()),
                );
                return;
            }
        };

        // a producer with no bound topics performs no connection work
        if topics.is_empty() {
            debug!(producer = %producer.id, "producer has no bound topics");
            return;
        }

        let connection = match self.factory.open(cluster).await {
            Ok(connection) => connection,
            Err(err) => {
                error!(
                    cluster = %cluster.id,
                    producer = %producer.id,
                    error = %err,
                    "unable to open producer connection"
                );
                report.record_failure(Role::Producer, &producer.id, err.into());
                return;
            }
        };

        for topic in &topics {
            self.resolve_producer_topic(&connection, topic, report).await;
        }

        connection.close().await;
    }

    async fn resolve_producer_topic(
        &self,
        connection: &ClusterConnection,
        topic: &Topic,
        report: &mut ResolutionReport,
    ) {
        debug!(topic = %topic.topic_name, "probing producer topic");

        let binding = match self.binder.bind(connection, topic).await {
            Ok(binding) => binding,
            Err(err) => {
                error!(topic = %topic.topic_name, error = %err, "unable to bind topic");
                report.record_failure(Role::ProducerTopic, &topic.id, err.into());
                return;
            }
        };

        // the binding is released regardless of the probe outcome
        let probed = self.binder.probe(connection, &binding).await;
        self.binder.release(binding).await;

        match probed {
            Ok(()) => report.record_resolved(Role::ProducerTopic, &topic.id),
            Err(err) => {
                error!(topic = %topic.topic_name, error = %err, "topic probe failed");
                report.record_failure(Role::ProducerTopic, &topic.id, err.into());
            }
        }
    }

    async fn resolve_consumer(
        &self,
        cluster: &Cluster,
        consumer: &Consumer,
        report: &mut ResolutionReport,
    ) {
        debug!(consumer = %consumer.id, cluster = %cluster.id, "resolving consumer");

        // consumers only validate that the cluster settings are usable for a
        // consumer role; no persistent connection is opened here
        if let Err(err) = build_connection_config(cluster) {
            error!(
                cluster = %cluster.id,
                consumer = %consumer.id,
                error = %err,
                "cluster settings unusable for consumer"
            );
            report.record_failure(Role::Consumer, &consumer.id, err.into());
            return;
        }
        report.record_resolved(Role::Consumer, &consumer.id);

        match self.storage.topics_for_consumer(&consumer.id).await {
            Ok(topics) => {
                for topic in &topics {
                    debug!(
                        topic = %topic.topic_name,
                        consumer = %consumer.id,
                        "consumer topic recorded"
                    );
                    report.record_resolved(Role::ConsumerTopic, &topic.id);
                }
            }
            Err(err) => {
                warn!(consumer = %consumer.id, error = %err, "unable to retrieve topics");
                report.record_failure(
                    Role::Consumer,
                    &consumer.id,
                    ResolveError::Store(err.to_string()),
                );
            }
        }
    }

    /// Report producers, consumers, and topics whose references resolve to
    /// nothing. The cluster walk never visits them, so they are collected
    /// from the full entity sets.
    async fn scan_unresolved(&self, clusters: &[Cluster], report: &mut ResolutionReport) {
        let cluster_ids: HashSet<&str> = clusters.iter().map(|c| c.id.as_str()).collect();

        let producers = self.storage.producers().await.unwrap_or_else(|err| {
            warn!(error = %err, "unable to scan producers for unresolved references");
            Vec::new()
        });
        let mut producer_ids: HashSet<String> = HashSet::new();
        for producer in producers {
            producer_ids.insert(producer.id.clone());
            if !cluster_ids.contains(producer.cluster_id.as_str()) {
                warn!(
                    producer = %producer.id,
                    cluster = %producer.cluster_id,
                    "producer references unknown cluster"
                );
                report.record_failure(
                    Role::Producer,
                    &producer.id,
                    ResolveError::UnresolvedReference {
                        target: "cluster",
                        target_id: producer.cluster_id,
                    },
                );
            }
        }

        let consumers = self.storage.consumers().await.unwrap_or_else(|err| {
            warn!(error = %err, "unable to scan consumers for unresolved references");
            Vec::new()
        });
        let mut consumer_ids: HashSet<String> = HashSet::new();
        for consumer in consumers {
            consumer_ids.insert(consumer.id.clone());
            if !cluster_ids.contains(consumer.cluster_id.as_str()) {
                warn!(
                    consumer = %consumer.id,
                    cluster = %consumer.cluster_id,
                    "consumer references unknown cluster"
                );
                report.record_failure(
                    Role::Consumer,
                    &consumer.id,
                    ResolveError::UnresolvedReference {
                        target: "cluster",
                        target_id: consumer.cluster_id,
                    },
                );
            }
        }

        let topics = self.storage.topics().await.unwrap_or_else(|err| {
            warn!(error = %err, "unable to scan topics for unresolved references");
            Vec::new()
        });
        for topic in topics {
            if let Some(producer_id) = topic.producer_ref() {
                if !producer_ids.contains(producer_id) {
                    warn!(
                        topic = %topic.id,
                        producer = producer_id,
                        "topic references unknown producer"
                    );
                    report.record_failure(
                        Role::ProducerTopic,
                        &topic.id,
                        ResolveError::UnresolvedReference {
                            target: "producer",
                            target_id: producer_id.to_string(),
                        },
                    );
                }
            }
            if let Some(consumer_id) = topic.consumer_ref() {
                if !consumer_ids.contains(consumer_id) {
                    warn!(
                        topic = %topic.id,
                        consumer = consumer_id,
                        "topic references unknown consumer"
                    );
                    report.record_failure(
                        Role::ConsumerTopic,
                        &topic.id,
                        ResolveError::UnresolvedReference {
                            target: "consumer",
                            target_id: consumer_id.to_string(),
                        },
                    );
                }
            }
        }
    }
}
