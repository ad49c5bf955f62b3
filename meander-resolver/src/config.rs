use crate::errors::ConfigError;

use meander_core::{
    Cluster, ConnectionConfig, BROKER_LIST, CLIENT_ID, SASL_MECHANISM, SASL_PASSWORD,
    SASL_USERNAME, SECURITY_PROTOCOL,
};

/// Build a validated connection configuration from a cluster definition.
///
/// Settings are applied one at a time in a fixed order; the first value the
/// client library rejects aborts the build and the partial configuration is
/// dropped, so an open call never sees it. The returned error names the
/// cluster field that carried the offending value.
pub fn build_connection_config(cluster: &Cluster) -> Result<ConnectionConfig, ConfigError> {
    let mut config = ConnectionConfig::new();

    let settings: [(&'static str, &str, &str); 6] = [
        ("brokers", BROKER_LIST, &cluster.brokers),
        (
            "security_protocol",
            SECURITY_PROTOCOL,
            &cluster.security_protocol,
        ),
        ("sasl_mechanism", SASL_MECHANISM, &cluster.sasl_mechanism),
        ("sasl_username", SASL_USERNAME, &cluster.sasl_username),
        ("sasl_password", SASL_PASSWORD, &cluster.sasl_password),
        ("client_id", CLIENT_ID, &cluster.client_id),
    ];

    for (field, key, value) in settings {
        config
            .try_set(key, value)
            .map_err(|cause| ConfigError { field, cause })?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> Cluster {
        Cluster {
            id: "main".to_string(),
            brokers: "b1:9092,b2:9092".to_string(),
            security_protocol: "sasl_ssl".to_string(),
            sasl_mechanism: "SCRAM-SHA-512".to_string(),
            sasl_username: "svc".to_string(),
            sasl_password: "secret".to_string(),
            client_id: "asterisk".to_string(),
            port: 1883,
            ssl: false,
        }
    }

    #[test]
    fn builds_full_config_in_setting_order() {
        let config = build_connection_config(&cluster()).unwrap();

        let keys: Vec<&str> = config.settings().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                BROKER_LIST,
                SECURITY_PROTOCOL,
                SASL_MECHANISM,
                SASL_USERNAME,
                SASL_PASSWORD,
                CLIENT_ID
            ]
        );
        assert_eq!(config.get(BROKER_LIST), Some("b1:9092,b2:9092"));
        assert_eq!(config.get(SECURITY_PROTOCOL), Some("sasl_ssl"));
    }

    #[test]
    fn unknown_security_protocol_names_the_field() {
        let mut bad = cluster();
        bad.security_protocol = "carrier_pigeon".to_string();

        let err = build_connection_config(&bad).unwrap_err();
        assert_eq!(err.field, "security_protocol");
        assert!(err.cause.contains("carrier_pigeon"));
    }

    #[test]
    fn unknown_sasl_mechanism_names_the_field() {
        let mut bad = cluster();
        bad.sasl_mechanism = "NTLM".to_string();

        let err = build_connection_config(&bad).unwrap_err();
        assert_eq!(err.field, "sasl_mechanism");
    }

    #[test]
    fn empty_broker_list_rejected() {
        let mut bad = cluster();
        bad.brokers = String::new();

        let err = build_connection_config(&bad).unwrap_err();
        assert_eq!(err.field, "brokers");
    }
}
