//! Pluggable SQL drivers for the snapshot/restore workflow.
//!
//! Snapshot commands prefer a host-side SQL connection over in-container
//! `psql`. Which client stack opens that connection is resolved by name in a
//! process-wide registry; the name is configured per image with
//! [`Postgres::with_sql_driver`](crate::Postgres::with_sql_driver). A name with
//! no registered driver is not an error, it just means the workflow always
//! takes the exec fallback.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use async_trait::async_trait;
use sqlx::{Connection, Executor, PgConnection};

use crate::error::Result;

/// Name of the built-in sqlx-backed driver, registered by default.
pub const DEFAULT_DRIVER: &str = "sqlx";

#[async_trait]
pub trait SqlDriver: Send + Sync {
    /// Open a connection to the given database URL.
    ///
    /// A failure here marks the driver unusable for the operation and the
    /// snapshot workflow falls back to in-container execution. Errors from the
    /// returned connection's `execute` do not trigger the fallback.
    async fn connect(&self, url: &str) -> Result<Box<dyn SqlConnection>>;
}

#[async_trait]
pub trait SqlConnection: Send {
    async fn execute(&mut self, sql: &str) -> Result<()>;
    async fn close(self: Box<Self>) -> Result<()>;
}

/// The built-in driver, backed by a raw [`sqlx::PgConnection`].
pub struct SqlxDriver;

#[async_trait]
impl SqlDriver for SqlxDriver {
    async fn connect(&self, url: &str) -> Result<Box<dyn SqlConnection>> {
        let conn = PgConnection::connect(url).await?;
        Ok(Box::new(SqlxConnection { conn }))
    }
}

struct SqlxConnection {
    conn: PgConnection,
}

#[async_trait]
impl SqlConnection for SqlxConnection {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.conn.execute(sql).await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

static REGISTRY: LazyLock<RwLock<HashMap<String, Arc<dyn SqlDriver>>>> = LazyLock::new(|| {
    let mut drivers: HashMap<String, Arc<dyn SqlDriver>> = HashMap::new();
    drivers.insert(DEFAULT_DRIVER.to_string(), Arc::new(SqlxDriver));
    RwLock::new(drivers)
});

/// Register a driver under a name, replacing any driver already registered
/// under that name.
pub fn register_driver(name: impl Into<String>, driver: Arc<dyn SqlDriver>) {
    REGISTRY
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(name.into(), driver);
}

pub(crate) fn lookup(name: &str) -> Option<Arc<dyn SqlDriver>> {
    REGISTRY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(name)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_driver_is_registered() {
        assert!(lookup(DEFAULT_DRIVER).is_some());
    }

    #[test]
    fn test_unknown_driver_is_absent() {
        assert!(lookup("does-not-exist").is_none());
    }

    #[test]
    fn test_registering_makes_driver_visible() {
        register_driver("custom", Arc::new(SqlxDriver));
        assert!(lookup("custom").is_some());
    }
}
