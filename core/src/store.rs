//! SQLite access for the result table.
//!
//! RULE: Only store.rs talks to the database.
//! The store is used exactly once, at startup: `load_table` consumes it,
//! so the connection is closed as soon as the rows are in memory.

use crate::{
    config::is_identifier,
    error::{ServiceError, ServiceResult},
    schema::ColumnKind,
    table::Table,
    types::INDEX_COLUMN,
};
use rusqlite::{types::Value, Connection, OpenFlags};

pub struct ResultStore {
    conn: Connection,
}

impl ResultStore {
    /// Open an existing database read-only. A missing file is an error,
    /// never an empty database.
    pub fn open(path: &str) -> ServiceResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )?;
        log::info!("store: opened {path}");
        Ok(Self { conn })
    }

    /// Wrap an already-open connection (used in tests).
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Read every row of `table` into memory.
    pub fn load_table(self, table: &str) -> ServiceResult<Table> {
        if !is_identifier(table) {
            return Err(ServiceError::Config(format!(
                "table name '{table}' is not a plain identifier"
            )));
        }
        let mut stmt = self.conn.prepare(&format!("SELECT * FROM \"{table}\""))?;
        let headers: Vec<(String, Option<ColumnKind>)> = stmt
            .columns()
            .iter()
            .map(|c| {
                (
                    c.name().to_string(),
                    c.decl_type().and_then(ColumnKind::from_declared_type),
                )
            })
            .collect();
        let width = headers.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("store: read {} rows x {width} columns from '{table}'", rows.len());

        let mut loaded = Table::from_rows(headers, rows)?;
        if loaded.drop_column(INDEX_COLUMN) {
            log::debug!("store: dropped '{INDEX_COLUMN}' column");
        }
        Ok(loaded)
    }
}
