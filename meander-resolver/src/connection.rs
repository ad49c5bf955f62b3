use crate::config::build_connection_config;
use crate::errors::OpenError;

use meander_core::{BrokerClient, Cluster, ConnectionHandle};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens producer-mode broker connections for cluster definitions.
#[derive(Clone)]
pub struct ConnectionFactory {
    client: Arc<dyn BrokerClient>,
}

impl ConnectionFactory {
    pub fn new(client: Arc<dyn BrokerClient>) -> Self {
        ConnectionFactory { client }
    }

    /// Build the cluster's connection configuration and open a connection
    /// with it. Ownership of the connection transfers to the caller, which
    /// must close it exactly once.
    pub async fn open(&self, cluster: &Cluster) -> Result<ClusterConnection, OpenError> {
        let config = build_connection_config(cluster)?;

        match self.client.open(&config).await {
            Ok(handle) => {
                debug!(cluster = %cluster.id, handle = handle.0, "cluster connection opened");
                Ok(ClusterConnection {
                    handle,
                    client: self.client.clone(),
                    closed: false,
                })
            }
            Err(err) => Err(OpenError::Rejected {
                cause: err.to_string(),
            }),
        }
    }
}

/// One open broker connection, exclusively owned by the resolution step that
/// opened it.
pub struct ClusterConnection {
    handle: ConnectionHandle,
    client: Arc<dyn BrokerClient>,
    closed: bool,
}

impl ClusterConnection {
    pub fn handle(&self) -> ConnectionHandle {
        self.handle
    }

    /// Close the underlying connection. Consumes the value so a connection
    /// cannot be used or closed again afterwards.
    pub async fn close(mut self) {
        self.closed = true;
        self.client.close(self.handle).await;
        debug!(handle = self.handle.0, "cluster connection closed");
    }
}

impl fmt::Debug for ClusterConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConnection")
            .field("handle", &self.handle)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Drop for ClusterConnection {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                handle = self.handle.0,
                "cluster connection dropped without explicit close"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meander_core::{ClientOp, LoopbackClient};

    fn cluster(id: &str) -> Cluster {
        Cluster {
            id: id.to_string(),
            brokers: "b1:9092".to_string(),
            security_protocol: "plaintext".to_string(),
            sasl_mechanism: "PLAIN".to_string(),
            sasl_username: String::new(),
            sasl_password: String::new(),
            client_id: "asterisk".to_string(),
            port: 1883,
            ssl: false,
        }
    }

    #[tokio::test]
    async fn open_and_close_exactly_once() {
        let client = Arc::new(LoopbackClient::new());
        let factory = ConnectionFactory::new(client.clone());

        let connection = factory.open(&cluster("main")).await.unwrap();
        let handle = connection.handle();
        assert_eq!(client.live_connections(), 1);

        connection.close().await;
        assert_eq!(client.live_connections(), 0);
        assert_eq!(
            client.op_log(),
            vec![ClientOp::Open(handle.0), ClientOp::Close(handle.0)]
        );
    }

    #[tokio::test]
    async fn invalid_cluster_config_never_reaches_open() {
        let client = Arc::new(LoopbackClient::new());
        let factory = ConnectionFactory::new(client.clone());

        let mut bad = cluster("main");
        bad.security_protocol = "quic".to_string();

        let err = factory.open(&bad).await.unwrap_err();
        assert!(matches!(err, OpenError::Config(ref c) if c.field == "security_protocol"));
        assert_eq!(client.open_calls(), 0);
    }

    #[tokio::test]
    async fn rejected_open_surfaces_cause() {
        let client = Arc::new(LoopbackClient::new());
        client.fail_opens("broker unreachable");
        let factory = ConnectionFactory::new(client.clone());

        let err = factory.open(&cluster("main")).await.unwrap_err();
        assert_eq!(
            err,
            OpenError::Rejected {
                cause: "unable to open connection: broker unreachable".to_string()
            }
        );
        assert_eq!(client.live_connections(), 0);
    }
}
