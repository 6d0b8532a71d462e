//! SQL for the snapshot/restore workflow.
//!
//! A snapshot is a copy of the managed database created with `CREATE DATABASE
//! .. WITH TEMPLATE ..`; restoring drops the managed database and recreates it
//! from that copy. Both run against the `postgres` maintenance database, which
//! is why a managed database of that name cannot be snapshotted.

use crate::error::{Error, Result};

/// Label used when a snapshot is taken or restored without an explicit name.
pub const DEFAULT_SNAPSHOT_NAME: &str = "migrated_template";

/// Database the snapshot commands connect through.
pub(crate) const MAINTENANCE_DB: &str = "postgres";

pub(crate) fn validate(db_name: &str, snapshot_name: &str) -> Result<()> {
    if db_name == MAINTENANCE_DB {
        return Err(Error::ReservedDatabase);
    }
    if snapshot_name.is_empty() {
        return Err(Error::EmptySnapshotName);
    }
    Ok(())
}

/// Commands capturing `db_name` under the `snapshot_name` label. An existing
/// snapshot under the same label is replaced.
pub(crate) fn snapshot_commands(db_name: &str, user: &str, snapshot_name: &str) -> Vec<String> {
    vec![
        format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            quote_ident(snapshot_name)
        ),
        format!(
            "CREATE DATABASE {} WITH TEMPLATE {} OWNER {}",
            quote_ident(snapshot_name),
            quote_ident(db_name),
            quote_ident(user),
        ),
    ]
}

/// Commands reinitializing `db_name` from the `snapshot_name` label. FORCE
/// kicks lingering client connections, so a restore can run from per-test
/// cleanup hooks while connections from the test body are still open.
pub(crate) fn restore_commands(db_name: &str, user: &str, snapshot_name: &str) -> Vec<String> {
    vec![
        format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            quote_ident(db_name)
        ),
        format!(
            "CREATE DATABASE {} WITH TEMPLATE {} OWNER {}",
            quote_ident(db_name),
            quote_ident(snapshot_name),
            quote_ident(user),
        ),
    ]
}

/// Quote an identifier for safe use in SQL
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_maintenance_db() {
        assert!(matches!(
            validate("postgres", DEFAULT_SNAPSHOT_NAME),
            Err(Error::ReservedDatabase)
        ));
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        assert!(matches!(
            validate("app", ""),
            Err(Error::EmptySnapshotName)
        ));
    }

    #[test]
    fn test_validate_accepts_regular_names() {
        assert!(validate("app", DEFAULT_SNAPSHOT_NAME).is_ok());
        assert!(validate("app", "custom-snapshot").is_ok());
    }

    #[test]
    fn test_snapshot_commands() {
        let cmds = snapshot_commands("test-db", "postgres", "snap");
        assert_eq!(
            cmds,
            vec![
                r#"DROP DATABASE IF EXISTS "snap" WITH (FORCE)"#.to_string(),
                r#"CREATE DATABASE "snap" WITH TEMPLATE "test-db" OWNER "postgres""#.to_string(),
            ]
        );
    }

    #[test]
    fn test_restore_commands() {
        let cmds = restore_commands("test-db", "postgres", "snap");
        assert_eq!(
            cmds,
            vec![
                r#"DROP DATABASE IF EXISTS "test-db" WITH (FORCE)"#.to_string(),
                r#"CREATE DATABASE "test-db" WITH TEMPLATE "snap" OWNER "postgres""#.to_string(),
            ]
        );
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("simple"), "\"simple\"");
        assert_eq!(quote_ident("with\"quote"), "\"with\"\"quote\"");
    }
}
