use meander_core::{Cluster, Consumer, Producer, Topic};
use serde::{Deserialize, Serialize};

/// Declarative topology definitions, as persisted on disk.
///
/// Every section is optional; a file that only defines clusters is valid and
/// simply resolves to nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyFile {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub producers: Vec<Producer>,
    #[serde(default)]
    pub consumers: Vec<Consumer>,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_definitions_parse_with_defaults() {
        let raw = r#"
clusters:
  - id: main
    brokers: "b1:9092,b2:9092"
    security_protocol: sasl_ssl
    sasl_mechanism: SCRAM-SHA-256
    sasl_username: svc
    sasl_password: secret
producers:
  - id: p1
    cluster: main
consumers:
  - id: c1
    cluster: main
topics:
  - id: t1
    topic: orders
    producer: p1
  - id: t2
    topic: audit
    consumer: c1
"#;
        let file: TopologyFile = serde_yaml::from_str(raw).unwrap();

        assert_eq!(file.clusters.len(), 1);
        assert_eq!(file.clusters[0].client_id, "asterisk");
        assert_eq!(file.clusters[0].port, 1883);
        assert_eq!(file.producers[0].cluster_id, "main");
        assert_eq!(file.topics[0].producer_ref(), Some("p1"));
        assert_eq!(file.topics[1].consumer_ref(), Some("c1"));
    }

    #[test]
    fn empty_file_is_valid() {
        let file: TopologyFile = serde_yaml::from_str("{}").unwrap();
        assert!(file.clusters.is_empty());
        assert!(file.topics.is_empty());
    }
}
