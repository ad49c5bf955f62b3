use anyhow::{bail, Context, Result};
use clap::Args;
use meander_core::{BrokerClient, LoopbackClient};
use meander_resolver::ResolverService;
use meander_store::{EntityStorage, MemoryStore, TopologyFile};
use std::fs::read_to_string;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Args)]
pub struct Resolve {
    /// Path to the topology definitions YAML file
    #[arg(short, long)]
    pub config: String,

    /// Re-run resolution this many additional times after the first pass
    #[arg(long, default_value_t = 0)]
    pub reload: u32,
}

pub async fn handle_resolve(resolve: Resolve) -> Result<()> {
    let content = read_to_string(Path::new(&resolve.config))
        .with_context(|| format!("failed to read topology definitions: {}", resolve.config))?;
    let definitions: TopologyFile = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse topology definitions: {}", resolve.config))?;

    // failure to open the entity store is the only fatal error
    let store = MemoryStore::new()
        .await
        .context("failed to open entity store")?;
    store
        .load(definitions)
        .await
        .context("failed to load topology definitions")?;

    let client: Arc<dyn BrokerClient> = Arc::new(LoopbackClient::new());
    let service = ResolverService::new(EntityStorage::InMemory(store), client);

    let mut report = service.start().await;
    println!("{report}");

    for pass in 1..=resolve.reload {
        info!(pass, "reloading");
        report = service.reload().await;
        println!("{report}");
    }

    service.shutdown();

    if !report.is_clean() {
        bail!("resolution completed with {} failures", report.failed_count());
    }

    Ok(())
}
