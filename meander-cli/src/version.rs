use meander_core::{BrokerClient, LoopbackClient};

pub fn handle_version() {
    let client = LoopbackClient::new();
    println!(
        "protocol client library currently running against: {}",
        client.version()
    );
}
