//! SQLite-backed relational backend.

use crate::backend::{Backend, BackendKind};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use nestdb_codec::{from_json, to_json, Value};
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A relational backend storing one row per root key.
///
/// The table has the shape `(id TEXT PRIMARY KEY, value REAL)` and is
/// created if missing when the connection opens. Numbers are stored
/// natively, `Null` as SQL `NULL`, and every other value as JSON text.
///
/// Counters follow relational rules: `subtract` always stores the result,
/// negative or not, and never deletes the row.
///
/// # Thread Safety
///
/// The connection sits behind a mutex; statements run one at a time.
#[derive(Debug)]
pub struct RelationalBackend {
    conn: Mutex<Option<Connection>>,
    table: String,
    location: Option<PathBuf>,
}

impl RelationalBackend {
    /// Opens or creates a database file and ensures the table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is not a plain identifier or the
    /// database cannot be opened.
    pub fn open(path: &Path, table: &str) -> StorageResult<Self> {
        validate_table(table)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn, table, Some(path.to_path_buf()))
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is not a plain identifier.
    pub fn open_in_memory(table: &str) -> StorageResult<Self> {
        validate_table(table)?;
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, table, None)
    }

    fn from_connection(
        conn: Connection,
        table: &str,
        location: Option<PathBuf>,
    ) -> StorageResult<Self> {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (id TEXT PRIMARY KEY, value REAL)"
            ),
            [],
        )?;
        info!(table, path = ?location, "relational backend ready");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            table: table.to_string(),
            location,
        })
    }

    /// The table holding this backend's rows.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The database file, or `None` for an in-memory database.
    #[must_use]
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(StorageError::Closed)?;
        f(conn)
    }
}

/// Accepts ASCII identifiers: letters, digits and `_`, not starting with a
/// digit.
fn validate_table(name: &str) -> StorageResult<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidTable {
            name: name.to_string(),
        })
    }
}

fn encode_column(value: &Value) -> StorageResult<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Number(n) => SqlValue::Real(*n),
        other => SqlValue::Text(to_json(other)?),
    })
}

#[allow(clippy::cast_precision_loss)]
fn decode_column(column: SqlValue) -> StorageResult<Value> {
    match column {
        SqlValue::Null => Ok(Value::Null),
        SqlValue::Integer(n) => Ok(Value::Number(n as f64)),
        SqlValue::Real(n) => Ok(Value::Number(n)),
        SqlValue::Text(text) => Ok(from_json(&text)?),
        SqlValue::Blob(_) => Err(StorageError::Corrupted(
            "unexpected blob in value column".to_string(),
        )),
    }
}

#[async_trait]
impl Backend for RelationalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn removes_depleted_counters(&self) -> bool {
        false
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        self.with_conn(|conn| {
            let column: Option<SqlValue> = conn
                .query_row(
                    &format!("SELECT value FROM \"{}\" WHERE id = ?1", self.table),
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            column.map(decode_column).transpose()
        })
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<Value> {
        let column = encode_column(&value)?;
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO \"{}\" (id, value) VALUES (?1, ?2) \
                     ON CONFLICT(id) DO UPDATE SET value = excluded.value",
                    self.table
                ),
                params![key, column],
            )?;
            Ok(())
        })?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!("DELETE FROM \"{}\" WHERE id = ?1", self.table),
                params![key],
            )?;
            Ok(())
        })
    }

    async fn all(&self) -> StorageResult<BTreeMap<String, Value>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT id, value FROM \"{}\"", self.table))?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, SqlValue>(1)?))
            })?;
            let mut records = BTreeMap::new();
            for row in rows {
                let (id, column) = row?;
                records.insert(id, decode_column(column)?);
            }
            Ok(records)
        })
    }

    async fn delete_all(&self) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(&format!("DELETE FROM \"{}\"", self.table), [])?;
            Ok(())
        })
    }

    async fn disconnect(&self) -> StorageResult<()> {
        let conn = self.conn.lock().take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, err)| StorageError::Sqlite(err))?;
            debug!(table = %self.table, "relational backend disconnected");
        }
        Ok(())
    }

    async fn subtract(&self, key: &str, amount: f64) -> StorageResult<f64> {
        let current = self
            .get(key)
            .await?
            .and_then(|value| value.to_number())
            .unwrap_or(0.0);
        let next = current - amount;
        self.set(key, Value::Number(next)).await?;
        Ok(next)
    }
}
