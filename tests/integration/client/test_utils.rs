//! Test utilities for stream client integration tests

use std::sync::Arc;

use quotrix::config::StreamConfig;
use quotrix::services::quotex::{MockConnector, MockRemote, QuotexClient};
use tokio::sync::mpsc;

/// Two fake endpoints so rotation is observable; real feed timings.
pub fn test_config() -> StreamConfig {
    StreamConfig {
        endpoints: vec![
            "wss://feed-a.example/socket.io/?EIO=3&transport=websocket".to_string(),
            "wss://feed-b.example/socket.io/?EIO=3&transport=websocket".to_string(),
        ],
        ..StreamConfig::default()
    }
}

pub struct TestClient {
    pub client: Arc<QuotexClient>,
    pub connector: Arc<MockConnector>,
    pub remotes: mpsc::UnboundedReceiver<MockRemote>,
}

impl TestClient {
    pub fn spawn(config: StreamConfig) -> Self {
        let (connector, remotes) = MockConnector::new();
        let client = QuotexClient::spawn(config, connector.clone())
            .expect("client should spawn with a valid config");
        Self {
            client: Arc::new(client),
            connector,
            remotes,
        }
    }

    pub async fn next_remote(&mut self) -> MockRemote {
        self.remotes
            .recv()
            .await
            .expect("a connection should be established")
    }
}
