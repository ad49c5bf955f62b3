use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named group of broker endpoints plus connection and security settings.
///
/// Field defaults follow the recognized configuration surface, so a cluster
/// definition only needs to spell out the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique resource id
    pub id: String,
    /// Initial (bootstrap) CSV list of brokers or host:port values
    #[serde(default = "default_brokers")]
    pub brokers: String,
    /// Security protocol used to communicate with brokers
    #[serde(default = "default_security_protocol")]
    pub security_protocol: String,
    /// SASL mechanism used to authenticate
    #[serde(default = "default_sasl_mechanism")]
    pub sasl_mechanism: String,
    /// SASL authentication username
    #[serde(default)]
    pub sasl_username: String,
    /// SASL authentication password
    #[serde(default)]
    pub sasl_password: String,
    /// Client identifier for connections opened against this cluster
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Broker port
    #[serde(default = "default_port")]
    pub port: u32,
    /// Broker requires an SSL connection
    #[serde(default)]
    pub ssl: bool,
}

/// A producer role bound to exactly one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    /// Unique resource id
    pub id: String,
    /// Cluster resource id
    #[serde(rename = "cluster")]
    pub cluster_id: String,
}

/// A consumer role bound to exactly one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    /// Unique resource id
    pub id: String,
    /// Cluster resource id
    #[serde(rename = "cluster")]
    pub cluster_id: String,
}

/// A wire-level topic bound to a producer and/or a consumer, independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Unique resource id
    pub id: String,
    /// Wire-level topic name
    #[serde(rename = "topic")]
    pub topic_name: String,
    /// Producer resource id
    #[serde(rename = "producer", default)]
    pub producer_id: Option<String>,
    /// Consumer resource id
    #[serde(rename = "consumer", default)]
    pub consumer_id: Option<String>,
}

impl Topic {
    /// Producer reference, treating an empty string as unset.
    pub fn producer_ref(&self) -> Option<&str> {
        self.producer_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Consumer reference, treating an empty string as unset.
    pub fn consumer_ref(&self) -> Option<&str> {
        self.consumer_id.as_deref().filter(|id| !id.is_empty())
    }
}

fn default_brokers() -> String {
    "localhost".to_string()
}

fn default_security_protocol() -> String {
    SecurityProtocol::Plaintext.to_string()
}

fn default_sasl_mechanism() -> String {
    SaslMechanism::Plain.to_string()
}

fn default_client_id() -> String {
    "asterisk".to_string()
}

fn default_port() -> u32 {
    1883
}

/// Protocol used to communicate with brokers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityProtocol {
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl SecurityProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityProtocol::Plaintext => "plaintext",
            SecurityProtocol::Ssl => "ssl",
            SecurityProtocol::SaslPlaintext => "sasl_plaintext",
            SecurityProtocol::SaslSsl => "sasl_ssl",
        }
    }
}

impl FromStr for SecurityProtocol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "plaintext" => Ok(SecurityProtocol::Plaintext),
            "ssl" => Ok(SecurityProtocol::Ssl),
            "sasl_plaintext" => Ok(SecurityProtocol::SaslPlaintext),
            "sasl_ssl" => Ok(SecurityProtocol::SaslSsl),
            other => Err(format!("unknown security protocol '{}'", other)),
        }
    }
}

impl fmt::Display for SecurityProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SASL mechanism used to authenticate against brokers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaslMechanism {
    Plain,
    Gssapi,
    ScramSha256,
    ScramSha512,
    OauthBearer,
}

impl SaslMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaslMechanism::Plain => "PLAIN",
            SaslMechanism::Gssapi => "GSSAPI",
            SaslMechanism::ScramSha256 => "SCRAM-SHA-256",
            SaslMechanism::ScramSha512 => "SCRAM-SHA-512",
            SaslMechanism::OauthBearer => "OAUTHBEARER",
        }
    }
}

impl FromStr for SaslMechanism {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PLAIN" => Ok(SaslMechanism::Plain),
            "GSSAPI" => Ok(SaslMechanism::Gssapi),
            "SCRAM-SHA-256" => Ok(SaslMechanism::ScramSha256),
            "SCRAM-SHA-512" => Ok(SaslMechanism::ScramSha512),
            "OAUTHBEARER" => Ok(SaslMechanism::OauthBearer),
            other => Err(format!("unknown SASL mechanism '{}'", other)),
        }
    }
}

impl fmt::Display for SaslMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
