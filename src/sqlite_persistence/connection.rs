use super::versioned_schema::{VersionedSchema, BASE_DB_VERSION};
use anyhow::{bail, Context, Result};
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::path::Path;
use tracing::info;

/// Current time as unix seconds. Every audit column is written through this.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// True if anywhere in the error chain sits a SQLite constraint violation
/// (unique index clash, foreign key failure, ...).
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<rusqlite::Error>()
            .and_then(|e| e.sqlite_error_code())
            == Some(ErrorCode::ConstraintViolation)
    })
}

/// Opens (or creates) a database and brings it to the latest of `schemas`.
///
/// A database without tables gets the latest schema directly. An existing one
/// is migrated forward from the version found in `PRAGMA user_version` and
/// then validated against the latest schema.
pub fn open_versioned_db<P: AsRef<Path>>(
    db_path: P,
    schemas: &[VersionedSchema],
    label: &str,
) -> Result<Connection> {
    let mut conn = Connection::open_with_flags(
        db_path.as_ref(),
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open {} database", label))?;

    // Per-connection setting, must be applied on every open.
    conn.execute("PRAGMA foreign_keys = ON;", [])?;

    let latest_version = schemas.len() - 1;
    let latest_schema = &schemas[latest_version];

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating {} db schema at version {}", label, latest_version);
        latest_schema.create(&conn)?;
        return Ok(conn);
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "The {} database has an unknown user_version {}",
            label,
            db_version
        );
    }
    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;

    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in schemas.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating {} db from version {} to {}",
                    label, current_version, schema.version
                );
                migration_fn(&tx)?;
            }
            current_version = schema.version;
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema
        .validate(&conn)
        .with_context(|| format!("The {} database does not match the expected schema", label))?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite_column;
    use crate::sqlite_persistence::{SqlType, Table};

    const ITEMS_V0: Table = Table {
        name: "items",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("code", &SqlType::Text, non_null = true, is_unique = true),
        ],
        indices: &[],
    };

    const ITEMS_V1: Table = Table {
        name: "items",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("code", &SqlType::Text, non_null = true, is_unique = true),
            sqlite_column!("label", &SqlType::Text),
        ],
        indices: &[],
    };

    fn add_label(conn: &Connection) -> Result<()> {
        conn.execute("ALTER TABLE items ADD COLUMN label TEXT", [])?;
        Ok(())
    }

    const V0_ONLY: &[VersionedSchema] = &[VersionedSchema {
        version: 0,
        tables: &[ITEMS_V0],
        migration: None,
    }];

    const V0_V1: &[VersionedSchema] = &[
        VersionedSchema {
            version: 0,
            tables: &[ITEMS_V0],
            migration: None,
        },
        VersionedSchema {
            version: 1,
            tables: &[ITEMS_V1],
            migration: Some(add_label),
        },
    ];

    #[test]
    fn migrates_existing_database_forward() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("items.db");

        drop(open_versioned_db(&path, V0_ONLY, "test").unwrap());
        let conn = open_versioned_db(&path, V0_V1, "test").unwrap();

        conn.execute("INSERT INTO items (code, label) VALUES ('a', 'A')", [])
            .unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, (BASE_DB_VERSION + 1) as i64);
    }

    #[test]
    fn unique_clash_is_reported_as_constraint_violation() {
        let dir = tempfile::TempDir::new().unwrap();
        let conn = open_versioned_db(dir.path().join("items.db"), V0_ONLY, "test").unwrap();

        conn.execute("INSERT INTO items (code) VALUES ('a')", [])
            .unwrap();
        let err: anyhow::Error = conn
            .execute("INSERT INTO items (code) VALUES ('a')", [])
            .map_err(anyhow::Error::from)
            .context("inserting item")
            .unwrap_err();

        assert!(is_constraint_violation(&err));
        assert!(!is_constraint_violation(&anyhow::anyhow!("nope")));
    }
}
