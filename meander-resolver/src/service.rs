use crate::report::ResolutionReport;
use crate::resolver::TopologyResolver;

use meander_core::BrokerClient;
use meander_store::EntityStorage;
use std::sync::Arc;
use tracing::info;

/// Process-scoped lifecycle around the topology resolver.
///
/// `start` runs the first resolution pass, `reload` re-runs it in full
/// against the current definitions. A reload never tears down the previous
/// pass first; each pass's runtime entities are independently owned and
/// release themselves.
pub struct ResolverService {
    client: Arc<dyn BrokerClient>,
    resolver: TopologyResolver,
}

impl ResolverService {
    pub fn new(storage: EntityStorage, client: Arc<dyn BrokerClient>) -> Self {
        let resolver = TopologyResolver::new(storage, client.clone());
        ResolverService { client, resolver }
    }

    /// Version string of the underlying protocol client library.
    pub fn client_version(&self) -> String {
        self.client.version()
    }

    /// Run the first resolution pass. The default producer lifecycle
    /// listener is installed by the storage backend at construction, so it
    /// already observed any load that happened before this call.
    pub async fn start(&self) -> ResolutionReport {
        info!("starting topology resolution");
        self.resolver.resolve_all().await
    }

    /// Re-run resolution from scratch against the current definitions.
    pub async fn reload(&self) -> ResolutionReport {
        info!("reload requested, re-running topology resolution");
        self.resolver.resolve_all().await
    }

    pub fn shutdown(&self) {
        info!("resolver service stopped");
    }
}
