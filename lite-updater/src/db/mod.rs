mod models;
pub use models::*;

use crate::error::UpdaterError;
use futures::{TryFutureExt, future};
use libsql::{Connection, Row};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Key/value store whose entries expire after a time-to-live.
pub trait TransientStore: Send + Sync {
    /// The stored value, or `None` when absent or expired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, UpdaterError>> + Send;

    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), UpdaterError>> + Send;
}

fn map_row_de<T: DeserializeOwned>(r: Row) -> impl Future<Output = Result<T, UpdaterError>> {
    let v = libsql::de::from_row::<T>(&r).map_err(|e| {
        tracing::error!(
            "Failed to deserialize {}: {}",
            std::any::type_name::<T>(),
            e
        );

        UpdaterError::from(e)
    });

    future::ready(v)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|v| v.as_secs() as i64)
        .unwrap_or_default()
}

/// Transient store persisted in a libsql database.
#[derive(Clone)]
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Open (or create) the cache database at `path`.
    pub async fn setup(path: impl AsRef<Path>) -> Result<Self, UpdaterError> {
        let path = path.as_ref();
        tracing::debug!("Setting up cache database at {}", path.display());

        if let Some(parent) = path.parent().filter(|v| !v.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                tracing::error!("Failed to create cache database directory: {}", e);
                e
            })?;
        }

        let db = libsql::Builder::new_local(path).build().await?;
        let connection = db.connect()?;

        connection.query("PRAGMA journal_mode = WAL", ()).await?;
        connection.query("PRAGMA synchronous = NORMAL", ()).await?;

        tracing::debug!("Connected to cache database");
        Self::ensure_db_structure(&connection).await?;

        Ok(Self { connection })
    }

    async fn ensure_db_structure(connection: &Connection) -> Result<(), UpdaterError> {
        tracing::trace!("Setting up database structure...");

        connection
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS transients (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )
        "#,
                (),
            )
            .await?;

        tracing::trace!("Database structure created.");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<(), UpdaterError> {
        self.connection
            .execute("DELETE FROM transients WHERE key = ?1", [key])
            .map_err(UpdaterError::from)
            .await?;

        Ok(())
    }

    /// Drop every expired entry, returning how many were removed.
    #[tracing::instrument(skip(self))]
    pub async fn purge_expired(&self) -> Result<u64, UpdaterError> {
        let removed = self
            .connection
            .execute(
                "DELETE FROM transients WHERE expires_at <= ?1",
                libsql::params![unix_now()],
            )
            .map_err(UpdaterError::from)
            .await?;

        Ok(removed)
    }
}

impl TransientStore for Database {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, UpdaterError> {
        let row = self
            .connection
            .query(
                "SELECT value, expires_at FROM transients WHERE key = ?1",
                [key],
            )
            .await?
            .next()
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let cached: CachedTransient = map_row_de(row).await?;
        if cached.expires_at <= unix_now() {
            tracing::trace!("Transient {} expired", key);
            self.delete(key).await?;
            return Ok(None);
        }

        Ok(Some(cached.value))
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), UpdaterError> {
        let expires_at = unix_now().saturating_add(ttl.as_secs() as i64);

        self.connection
            .execute(
                r#"
                        INSERT INTO transients
                            (key, value, expires_at)
                        VALUES (?1, ?2, ?3) ON CONFLICT DO UPDATE SET
                            value = ?2, expires_at = ?3;
                     "#,
                libsql::params![key, value, expires_at],
            )
            .map_err(UpdaterError::from)
            .await?;

        Ok(())
    }
}

/// Process-local transient store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop an entry regardless of its expiry.
    pub fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

impl TransientStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, UpdaterError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        match entries.get(key) {
            Some((value, expires)) if Instant::now() < *expires => Ok(Some(value.clone())),
            Some(_) => {
                tracing::trace!("Transient {} expired", key);
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), UpdaterError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_owned(), (value.to_owned(), Instant::now() + ttl));

        Ok(())
    }
}
