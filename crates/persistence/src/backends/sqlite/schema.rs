//! SQLite schema definitions and migrations.

use std::str::FromStr;

use rusqlite::{Connection, params};
use rust_decimal::Decimal;

use crate::error::{BackendError, LedgerError, LedgerResult};

use super::rows::amount_key;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 3;

fn schema_error(context: &str, err: rusqlite::Error) -> LedgerError {
    LedgerError::Backend(BackendError::MigrationError {
        message: format!("{}: {}", context, err),
    })
}

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> LedgerResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        // Fresh database - create base schema then run all migrations
        create_schema_v1(conn)?;
        set_schema_version(conn, 1)?;
        migrate_schema(conn, 1)?;
    } else if current_version < SCHEMA_VERSION {
        migrate_schema(conn, current_version)?;
    }

    Ok(())
}

/// Get the current schema version.
pub fn get_schema_version(conn: &Connection) -> LedgerResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| schema_error("Failed to create schema_version table", e))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> LedgerResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| schema_error("Failed to clear schema_version", e))?;

    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )
    .map_err(|e| schema_error("Failed to set schema_version", e))?;

    Ok(())
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tenants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id TEXT NOT NULL REFERENCES tenants(id),
            contact_type TEXT NOT NULL CHECK (contact_type IN ('customer', 'vendor')),
            display_name TEXT NOT NULL,
            email TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id TEXT NOT NULL REFERENCES tenants(id),
            name TEXT NOT NULL,
            sellable INTEGER NOT NULL DEFAULT 1,
            purchasable INTEGER NOT NULL DEFAULT 1,
            sell_price TEXT,
            cost_price TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id TEXT NOT NULL REFERENCES tenants(id),
            document_type TEXT NOT NULL,
            document_number TEXT,
            counterparty_id INTEGER NOT NULL REFERENCES contacts(id),
            document_date TEXT NOT NULL,
            due_date TEXT,
            reference TEXT,
            note TEXT,
            amount TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_number
            ON documents(tenant_id, document_type, document_number);

        CREATE TABLE IF NOT EXISTS item_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id TEXT NOT NULL REFERENCES tenants(id),
            reference_type TEXT NOT NULL,
            reference_id INTEGER NOT NULL,
            entry_index INTEGER NOT NULL,
            item_id INTEGER NOT NULL REFERENCES items(id),
            description TEXT,
            quantity TEXT NOT NULL,
            rate TEXT NOT NULL,
            discount TEXT NOT NULL DEFAULT '0',
            amount TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_items_tenant ON items(tenant_id, id);
        CREATE INDEX IF NOT EXISTS idx_contacts_tenant ON contacts(tenant_id, contact_type, id);
        CREATE INDEX IF NOT EXISTS idx_entries_reference
            ON item_entries(tenant_id, reference_type, reference_id);",
    )
    .map_err(|e| schema_error("Failed to create base schema", e))
}

/// Run migrations from the given version to the current version.
fn migrate_schema(conn: &Connection, from_version: i32) -> LedgerResult<()> {
    let mut version = from_version;

    while version < SCHEMA_VERSION {
        match version {
            1 => migrate_v1_to_v2(conn)?,
            2 => migrate_v2_to_v3(conn)?,
            _ => {
                return Err(LedgerError::Backend(BackendError::MigrationError {
                    message: format!("Unknown schema version: {}", version),
                }));
            }
        }
        version += 1;
        set_schema_version(conn, version)?;
        tracing::info!(version, "Migrated SQLite schema");
    }

    Ok(())
}

/// Migrate from schema version 1 to version 2.
///
/// Adds the publication lifecycle columns and the listing index.
fn migrate_v1_to_v2(conn: &Connection) -> LedgerResult<()> {
    let migrations = [
        "ALTER TABLE documents ADD COLUMN status TEXT NOT NULL DEFAULT 'draft'",
        "ALTER TABLE documents ADD COLUMN published_at TEXT",
        "CREATE INDEX IF NOT EXISTS idx_documents_listing
            ON documents(tenant_id, document_type, document_date, id)",
    ];

    for sql in &migrations {
        conn.execute(sql, [])
            .map_err(|e| schema_error("Failed to migrate schema to v2", e))?;
    }

    Ok(())
}

/// Migrate from schema version 2 to version 3.
///
/// Adds `amount_key`, an order-preserving text form of `amount` used for
/// exact amount filters and sorting, and backfills it from existing rows.
fn migrate_v2_to_v3(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(
        "ALTER TABLE documents ADD COLUMN amount_key TEXT NOT NULL DEFAULT '';
         CREATE INDEX IF NOT EXISTS idx_documents_amount
            ON documents(tenant_id, document_type, amount_key, id);",
    )
    .map_err(|e| schema_error("Failed to migrate schema to v3", e))?;

    let rows: Vec<(i64, String)> = {
        let mut stmt = conn
            .prepare("SELECT id, amount FROM documents")
            .map_err(|e| schema_error("Failed to read amounts", e))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| schema_error("Failed to read amounts", e))?;
        rows.collect::<Result<_, _>>()
            .map_err(|e| schema_error("Failed to read amounts", e))?
    };

    for (id, amount) in rows {
        let amount = Decimal::from_str(&amount).map_err(|e| {
            LedgerError::Backend(BackendError::MigrationError {
                message: format!("Invalid amount '{}' on document {}: {}", amount, id, e),
            })
        })?;
        conn.execute(
            "UPDATE documents SET amount_key = ?1 WHERE id = ?2",
            params![amount_key(&amount), id],
        )
        .map_err(|e| schema_error("Failed to backfill amount_key", e))?;
    }

    Ok(())
}
