use std::{
    path::Path,
    sync::{Arc, Mutex as StdMutex},
};

use anyhow::anyhow;
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tokio::task::spawn_blocking;

use super::{CredentialRecord, CredentialStore, StoreError, validate_table_name};

/// SQLite-backed credential table keyed by the `jwt_token` column.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    conn: Arc<StdMutex<Connection>>,
    table: Arc<str>,
}

impl SqliteCredentialStore {
    /// Opens an existing credential database read-only. The file and the
    /// table must already exist; neither is created.
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self, StoreError> {
        validate_table_name(table)?;
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| {
            StoreError::Backend(
                anyhow!(err).context(format!("open credential database {}", path.display())),
            )
        })?;
        ensure_table(&conn, table)?;
        Ok(Self::from_connection(conn, table))
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory(table: &str) -> Result<Self, StoreError> {
        validate_table_name(table)?;
        let conn = Connection::open_in_memory().map_err(|err| StoreError::Backend(err.into()))?;
        conn.execute_batch(&format!(
            "CREATE TABLE \"{table}\" (\n    jwt_token TEXT PRIMARY KEY,\n    attributes TEXT\n);"
        ))
        .map_err(|err| StoreError::Backend(err.into()))?;
        Ok(Self::from_connection(conn, table))
    }

    fn from_connection(conn: Connection, table: &str) -> Self {
        Self {
            conn: Arc::new(StdMutex::new(conn)),
            table: Arc::from(table),
        }
    }

    async fn with_conn<F, T>(&self, func: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Backend(anyhow!("sqlite connection poisoned")))?;
            func(&guard)
        })
        .await
        .map_err(|err| StoreError::Backend(err.into()))?
    }

    #[cfg(test)]
    pub(crate) async fn insert(
        &self,
        credential: &str,
        attributes: Option<&str>,
    ) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO \"{}\" (jwt_token, attributes) VALUES (?1, ?2)",
            self.table
        );
        let credential = credential.to_string();
        let attributes = attributes.map(str::to_string);
        self.with_conn(move |conn| {
            conn.execute(&sql, params![credential, attributes])
                .map_err(|err| StoreError::Backend(err.into()))?;
            Ok(())
        })
        .await
    }
}

fn ensure_table(conn: &Connection, table: &str) -> Result<(), StoreError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| StoreError::Backend(err.into()))?;
    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::MissingTable(table.to_string())),
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn lookup(&self, credential: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let sql = format!(
            "SELECT attributes FROM \"{}\" WHERE jwt_token = ?1",
            self.table
        );
        let key = credential.to_string();
        self.with_conn(move |conn| {
            let row: Option<Option<String>> = conn
                .query_row(&sql, params![key], |row| row.get(0))
                .optional()
                .map_err(|err| StoreError::Backend(err.into()))?;
            Ok(row.map(|attributes| {
                CredentialRecord::from_stored(key, attributes.unwrap_or_default().as_bytes())
            }))
        })
        .await
    }
}
