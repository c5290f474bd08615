use crate::error::{Result, StoreError};
use rusqlite::{Connection, OptionalExtension};

const SCHEMA_TABLE: &str = "calltree_schema";

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_init.sql",
    include_str!("../migrations/001_init.sql"),
)];

pub fn latest_version() -> i64 {
    MIGRATIONS.len() as i64
}

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    let current = ensure_schema_table(&tx)?;

    if current > latest_version() {
        return Err(StoreError::Migration(format!(
            "db version {current} newer than available migrations {}",
            latest_version()
        )));
    }

    for (index, (name, sql)) in MIGRATIONS.iter().enumerate() {
        let version = (index + 1) as i64;
        if current >= version {
            continue;
        }
        tx.execute_batch(sql)
            .map_err(|err| StoreError::Migration(format!("{name}: {err}")))?;
        set_version(&tx, version)?;
    }

    tx.commit()?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i64> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [SCHEMA_TABLE],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(0);
    }
    let version: Option<i64> = conn
        .query_row(
            &format!("SELECT version FROM {SCHEMA_TABLE} LIMIT 1;"),
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version.unwrap_or(0))
}

fn ensure_schema_table(conn: &Connection) -> Result<i64> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {SCHEMA_TABLE} (version INTEGER NOT NULL);"
    ))?;

    let existing: Option<i64> = conn
        .query_row(
            &format!("SELECT version FROM {SCHEMA_TABLE} LIMIT 1;"),
            [],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(version) => Ok(version),
        None => {
            conn.execute(
                &format!("INSERT INTO {SCHEMA_TABLE} (version) VALUES (0);"),
                [],
            )?;
            Ok(0)
        }
    }
}

fn set_version(conn: &Connection, version: i64) -> Result<()> {
    let updated = conn.execute(
        &format!("UPDATE {SCHEMA_TABLE} SET version = ?1;"),
        [version],
    )?;
    if updated != 1 {
        return Err(StoreError::Migration(format!(
            "expected single schema row, updated {updated}"
        )));
    }
    Ok(())
}
