use thiserror::Error;

/// A cluster setting the client library refused to accept.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cluster setting '{field}' rejected: {cause}")]
pub struct ConfigError {
    /// Entity field whose value was rejected
    pub field: &'static str,
    /// Cause reported by the client library
    pub cause: String,
}

/// Connection establishment failure. The offending cluster and producer ids
/// are logged by the caller, not embedded here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OpenError {
    #[error("invalid cluster configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("connection open failed: {cause}")]
    Rejected { cause: String },
}

/// Topic handle creation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("topic handle creation failed: {cause}")]
pub struct BindError {
    pub cause: String,
}

/// Connectivity probe failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("probe send failed: {0}")]
    Send(String),

    #[error("probe flush failed: {0}")]
    Flush(String),
}

/// Any failure recorded against a single entity during a resolution pass.
/// None of these abort the pass; siblings continue to resolve.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("references missing {target} '{target_id}'")]
    UnresolvedReference {
        /// Referenced entity type
        target: &'static str,
        /// Referenced entity id that does not resolve
        target_id: String,
    },

    #[error("store error: {0}")]
    Store(String),
}
