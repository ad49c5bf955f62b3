//! Meander-Core
//!
//! Meander-Core -- shared entity model and the broker protocol client seam

mod entity;
pub use entity::{Cluster, Consumer, Producer, SaslMechanism, SecurityProtocol, Topic};

mod client;
pub use client::{
    BrokerClient, ClientError, ConnectionConfig, ConnectionHandle, DeliveryObserver, TopicHandle,
    BROKER_LIST, CLIENT_ID, SASL_MECHANISM, SASL_PASSWORD, SASL_USERNAME, SECURITY_PROTOCOL,
};

mod loopback;
pub use loopback::{ClientOp, LoopbackClient};
