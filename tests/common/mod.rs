//! Common test utilities and fixtures
//!
//! These tests start real containers. To run them, ensure Docker is installed
//! and the current user has permission to access the Docker socket (e.g. user
//! is in the docker group).

use std::path::{Path, PathBuf};
use std::sync::Once;

use pgcage::PostgresContainer;

pub const DB_NAME: &str = "test-db";
pub const USER: &str = "postgres";
pub const PASSWORD: &str = "password";

static INIT: Once = Once::new();

/// Initialize test logging
pub fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("pgcage=debug,testcontainers=info")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Resolve a fixture under `tests/testdata`.
pub fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(name)
}

/// Stand-in for a migration: the table the snapshot tests mutate.
pub async fn create_users_table(pg: &PostgresContainer) -> anyhow::Result<()> {
    pg.psql("CREATE TABLE users (id SERIAL, name TEXT NOT NULL, age INT NOT NULL)")
        .await?;
    Ok(())
}
