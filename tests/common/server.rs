//! Test server management.
//!
//! Spawns parlord gateways in-process on an ephemeral port so the suite
//! needs no pre-built binary and every test gets an isolated server.

use parlord::config::Config;
use parlord::network::{Gateway, ServerHandle};
use std::net::SocketAddr;
use tokio::task::JoinHandle;

use super::client::TestClient;

/// A running in-process server.
pub struct TestServer {
    handle: ServerHandle,
    task: Option<JoinHandle<anyhow::Result<()>>>,
}

/// A config bound to an ephemeral loopback port, metrics disabled.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.name = "parlord-test".to_string();
    config.server.listen = "127.0.0.1:0".parse().unwrap();
    config.server.metrics_port = Some(0);
    config
}

/// [`test_config`] with small capacity limits for capacity tests. The wire
/// behavior is identical at any scale; small limits keep the suite fast.
pub fn small_config(
    max_sessions: usize,
    workers: usize,
    worker_capacity: usize,
    max_rooms: usize,
    room_capacity: usize,
) -> Config {
    let mut config = test_config();
    config.limits.max_sessions = max_sessions;
    config.limits.workers = workers;
    config.limits.worker_capacity = worker_capacity;
    config.limits.max_rooms = max_rooms;
    config.limits.room_capacity = room_capacity;
    config
}

impl TestServer {
    /// Spawn a server with default (full-scale) limits.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(test_config()).await
    }

    /// Spawn a server with the given configuration.
    pub async fn spawn_with(config: Config) -> anyhow::Result<Self> {
        let gateway = Gateway::bind(config).await?;
        let handle = gateway.handle();
        let task = tokio::spawn(gateway.run());
        Ok(Self {
            handle,
            task: Some(task),
        })
    }

    /// Address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    /// Connect a raw test client.
    pub async fn connect(&self) -> anyhow::Result<TestClient> {
        TestClient::connect(self.addr()).await
    }

    /// Signal shutdown and wait for the gateway to drain and stop.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.handle.shutdown();
        if let Some(task) = self.task.take() {
            task.await??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Wake the gateway and workers so their threads exit even when a
        // test returns without an explicit shutdown.
        self.handle.shutdown();
    }
}
