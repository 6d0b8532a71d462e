//! Ephemeral PostgreSQL containers for integration testing.
//!
//! Wraps the [`testcontainers`] orchestration library with a
//! Postgres-specific image: credentials, init scripts, server configuration,
//! TLS material and readiness probing, plus a snapshot/restore workflow that
//! resets the database between tests. Container lifecycle, port mapping and
//! log waiting stay with `testcontainers`; SQL client work stays with `sqlx`.
//!
//! ```no_run
//! use pgcage::Postgres;
//!
//! # async fn demo() -> pgcage::Result<()> {
//! let pg = Postgres::default().with_db_name("app").run().await?;
//!
//! // run migrations, then capture the state to restore between tests
//! pg.psql("CREATE TABLE users (id SERIAL, name TEXT NOT NULL)").await?;
//! pg.snapshot().await?;
//!
//! // ... a test mutates the database through pg.connection_string() ...
//!
//! pg.restore().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Snapshot commands prefer a host-side SQL connection (see [`driver`]) and
//! fall back to in-container `psql` when no usable driver is registered.

pub mod container;
pub mod driver;
pub mod error;
pub mod image;
pub mod snapshot;
mod ssl;

pub use container::{ExecOutput, PostgresContainer};
pub use driver::{DEFAULT_DRIVER, SqlConnection, SqlDriver, SqlxDriver, register_driver};
pub use error::{Error, Result};
pub use image::Postgres;
pub use snapshot::DEFAULT_SNAPSHOT_NAME;
pub use ssl::{SSL_CA_FILE, SSL_CERT_FILE, SSL_KEY_FILE};
