//! Meander-Resolver
//!
//! Meander-Resolver -- resolves declared messaging topologies into live
//! broker connections, in dependency order, and tears them down safely.

pub mod errors;

mod config;
pub use config::build_connection_config;

mod connection;
pub use connection::{ClusterConnection, ConnectionFactory};

mod binding;
pub use binding::{
    BindingRegistry, TopicBinder, TopicBinding, FLUSH_SUCCESS_IS_PROBE_FAILURE, PROBE_FLUSH_TIMEOUT,
    PROBE_PAYLOAD,
};

mod report;
pub use report::{Outcome, ResolutionReport, Role};

mod resolver;
pub use resolver::TopologyResolver;

mod service;
pub use service::ResolverService;
