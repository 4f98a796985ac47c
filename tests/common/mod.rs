//! Test utilities and server harness for Beacon tests.
//!
//! Provides:
//! - In-process test server setup
//! - Test database fixtures

#![allow(dead_code)]

use beacon::config::Config;
use beacon::observability::telemetry::Telemetry;
use beacon::server::{serve, AppState};
use beacon::storage::Database;
use std::net::SocketAddr;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with a temporary database directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// Get the database path as a string.
    pub fn db_path_str(&self) -> &str {
        self.db_path.to_str().expect("invalid path")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Beacon server running in-process on an ephemeral port.
///
/// Telemetry export is disabled; the server stops when [`TestServer::shutdown`]
/// is called.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<beacon::Result<()>>,
}

impl TestServer {
    /// Start a server without a database.
    pub async fn start() -> Self {
        Self::start_with_database(None).await
    }

    /// Start a server backed by `database`.
    pub async fn start_with_database(database: Option<Database>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        let addr = listener.local_addr().expect("no local addr");

        let config = Config {
            addr,
            otel_endpoint: String::new(),
            ..Config::default()
        };
        let state = AppState::new(&config, &Telemetry::disabled(), database);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(serve(listener, state, shutdown_rx));

        Self {
            addr,
            shutdown_tx,
            handle,
        }
    }

    /// URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Signal shutdown and wait for the server to stop.
    pub async fn shutdown(self) -> beacon::Result<()> {
        let _ = self.shutdown_tx.send(true);
        tokio::time::timeout(std::time::Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.temp_dir.path().exists());
        assert!(fixture.db_path_str().contains("test.db"));
    }
}
