use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Container error: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid connection string: {0}")]
    ConnectionString(String),

    #[error("Invalid init script: {0}")]
    InitScript(String),

    #[error("Invalid SSL key material: {0}")]
    SslMaterial(String),

    #[error("Snapshots of the reserved `postgres` maintenance database are not supported")]
    ReservedDatabase,

    #[error("Snapshot name must not be empty")]
    EmptySnapshotName,

    #[error("Command {command} exited with code {exit_code}: {output}")]
    CommandFailed {
        command: String,
        exit_code: i64,
        output: String,
    },

    #[error("Database not ready after {elapsed:?}: {last_error}")]
    ReadyTimeout {
        elapsed: Duration,
        last_error: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
