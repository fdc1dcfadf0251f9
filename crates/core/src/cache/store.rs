//! Versioned store operations.
//!
//! One store per cache version. Entries are keyed by the canonical request
//! URL; a put overwrites any previous entry for the same key (last write
//! wins). Old stores are removed wholesale at activation, never entry by
//! entry.

use super::connection::CacheDb;
use crate::Error;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A response captured into the store.
///
/// The body is held as [`Bytes`] so the copy written to the store and the
/// copy returned to the caller can share the same buffer; cloning is cheap
/// and gives each consumer an independent handle.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    /// Canonical request URL this entry answers.
    pub request_key: String,
    /// HTTP status the response carried when captured.
    pub status: u16,
    pub content_type: Option<String>,
    /// Response headers serialized as a JSON object, if captured.
    pub headers_json: Option<String>,
    pub body: Bytes,
    /// RFC 3339 capture timestamp.
    pub stored_at: String,
}

impl StoredResponse {
    /// Build an entry stamped with the current time.
    pub fn new(request_key: impl Into<String>, status: u16, content_type: Option<String>, body: Bytes) -> Self {
        Self {
            request_key: request_key.into(),
            status,
            content_type,
            headers_json: None,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Handle to the store for one cache version.
///
/// Opening is idempotent: the store row is created if absent and reused
/// otherwise. All entry operations are scoped to this version.
#[derive(Clone, Debug)]
pub struct VersionedStore {
    db: CacheDb,
    version: String,
}

impl VersionedStore {
    /// Open (creating if absent) the store for `version`.
    pub async fn open(db: CacheDb, version: impl Into<String>) -> Result<Self, Error> {
        let version = version.into();
        {
            let version = version.clone();
            let created_at = chrono::Utc::now().to_rfc3339();
            db.conn
                .call(move |conn| -> Result<(), Error> {
                    conn.execute(
                        "INSERT OR IGNORE INTO stores (version, created_at) VALUES (?1, ?2)",
                        params![version, created_at],
                    )?;
                    Ok(())
                })
                .await
                .map_err(Error::from)?;
        }
        Ok(Self { db, version })
    }

    /// The cache version this store is scoped to.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Insert or overwrite the entry for `entry.request_key`.
    pub async fn put(&self, entry: &StoredResponse) -> Result<(), Error> {
        let entry = entry.clone();
        let version = self.version.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        version, request_key, status, content_type, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(version, request_key) DO UPDATE SET
                        status = excluded.status,
                        content_type = excluded.content_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        version,
                        entry.request_key,
                        entry.status,
                        entry.content_type,
                        entry.headers_json,
                        &entry.body[..],
                        entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Exact-match lookup by canonical request URL.
    ///
    /// Returns None on a miss; there is no fuzzy or prefix matching.
    pub async fn get(&self, request_key: &str) -> Result<Option<StoredResponse>, Error> {
        let request_key = request_key.to_string();
        let version = self.version.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT request_key, status, content_type, headers_json, body, stored_at
                     FROM entries WHERE version = ?1 AND request_key = ?2",
                )?;

                let result = stmt.query_row(params![version, request_key], |row| {
                    Ok(StoredResponse {
                        request_key: row.get(0)?,
                        status: row.get(1)?,
                        content_type: row.get(2)?,
                        headers_json: row.get(3)?,
                        body: Bytes::from(row.get::<_, Vec<u8>>(4)?),
                        stored_at: row.get(5)?,
                    })
                });

                match result {
                    Ok(e) => Ok(Some(e)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}

impl CacheDb {
    /// Enumerate every store version ever opened, oldest first.
    pub async fn list_versions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT version FROM stores ORDER BY created_at, version")?;
                let versions = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(versions)
            })
            .await
            .map_err(Error::from)
    }

    /// Irreversibly remove a store; its entries cascade away with it.
    pub async fn delete_store(&self, version: &str) -> Result<(), Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM stores WHERE version = ?1", params![version])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries held by a version's store.
    pub async fn entry_count(&self, version: &str) -> Result<u64, Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE version = ?1",
                    params![version],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
