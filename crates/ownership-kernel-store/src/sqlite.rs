//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the Ownership Kernel. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use ownership_kernel_core::{ObjectId, PackageId};
use ownership_kernel_perms::{Namespace, PackageHandoff};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{InsertResult, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("mutex poisoned: {e}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {e}")))?
    }
}

/// Decode a 32-byte id column.
fn id_bytes(bytes: Vec<u8>, column: &str) -> Result<[u8; 32]> {
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| StoreError::InvalidData(format!("{column}: expected 32 bytes, got {}", b.len())))
}

/// Where `package` is indexed: `None` if never claimed, `Some(None)` while
/// detached.
fn package_location(
    conn: &Connection,
    package: &PackageId,
) -> Result<Option<Option<ObjectId>>> {
    let row: Option<Option<Vec<u8>>> = conn
        .query_row(
            "SELECT namespace_id FROM packages WHERE package_id = ?1",
            params![package.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .optional()?;

    row.map(|location| {
        location
            .map(|bytes| id_bytes(bytes, "namespace_id").map(ObjectId::from_bytes))
            .transpose()
    })
    .transpose()
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_namespace(&self, namespace: &Namespace) -> Result<InsertResult> {
        let namespace = namespace.clone();
        let body = codec::encode(&namespace)?;

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let id = namespace.id();
            let now = now_millis();

            let exists: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM namespaces WHERE namespace_id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_some() {
                return Ok(InsertResult::AlreadyExists);
            }

            for package in namespace.packages() {
                if let Some(existing) = package_location(&tx, package)? {
                    return Ok(InsertResult::PackageConflict {
                        package: *package,
                        existing,
                    });
                }
            }

            tx.execute(
                "INSERT INTO namespaces (namespace_id, principal, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    id.as_bytes().as_slice(),
                    namespace.principal().as_bytes().as_slice(),
                    body,
                    now,
                ],
            )?;
            for package in namespace.packages() {
                tx.execute(
                    "INSERT INTO packages (package_id, namespace_id, claimed_at) VALUES (?1, ?2, ?3)",
                    params![package.as_bytes().as_slice(), id.as_bytes().as_slice(), now],
                )?;
            }

            tx.commit()?;
            tracing::debug!(namespace = %id, packages = namespace.packages().len(), "inserted namespace");
            Ok(InsertResult::Inserted)
        })
        .await
    }

    async fn get_namespace(&self, id: &ObjectId) -> Result<Option<Namespace>> {
        let id = *id;

        self.blocking(move |conn| {
            let body: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT body FROM namespaces WHERE namespace_id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            body.map(|b| codec::decode(&b)).transpose()
        })
        .await
    }

    async fn update_namespace(&self, namespace: &Namespace) -> Result<()> {
        let namespace = namespace.clone();
        let body = codec::encode(&namespace)?;

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let id = namespace.id();
            let now = now_millis();

            let updated = tx.execute(
                "UPDATE namespaces SET body = ?2, updated_at = ?3 WHERE namespace_id = ?1",
                params![id.as_bytes().as_slice(), body, now],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(format!("namespace {id}")));
            }

            for package in namespace.packages() {
                if let Some(Some(existing)) = package_location(&tx, package)? {
                    if existing != id {
                        return Err(StoreError::Conflict {
                            package: package.to_string(),
                            existing: existing.to_string(),
                        });
                    }
                }
            }

            tx.execute(
                "UPDATE packages SET namespace_id = NULL WHERE namespace_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            for package in namespace.packages() {
                tx.execute(
                    "INSERT INTO packages (package_id, namespace_id, claimed_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(package_id) DO UPDATE SET namespace_id = excluded.namespace_id",
                    params![package.as_bytes().as_slice(), id.as_bytes().as_slice(), now],
                )?;
            }

            tx.commit()?;
            tracing::debug!(namespace = %id, "updated namespace");
            Ok(())
        })
        .await
    }

    async fn list_namespaces(&self) -> Result<Vec<ObjectId>> {
        self.blocking(|conn| {
            let mut stmt =
                conn.prepare("SELECT namespace_id FROM namespaces ORDER BY namespace_id")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|bytes| id_bytes(bytes, "namespace_id").map(ObjectId::from_bytes))
                .collect()
        })
        .await
    }

    async fn namespace_for_package(&self, package: &PackageId) -> Result<Option<ObjectId>> {
        let package = *package;
        self.blocking(move |conn| Ok(package_location(conn, &package)?.flatten()))
            .await
    }

    async fn is_package_claimed(&self, package: &PackageId) -> Result<bool> {
        let package = *package;
        self.blocking(move |conn| Ok(package_location(conn, &package)?.is_some()))
            .await
    }

    async fn put_handoff(&self, handoff: &PackageHandoff) -> Result<()> {
        let body = codec::encode(handoff)?;
        let id = handoff.id();
        let package = handoff.package();
        let holder = handoff.holder();

        self.blocking(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO package_handoffs (handoff_id, package_id, holder, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.as_bytes().as_slice(),
                    package.as_bytes().as_slice(),
                    holder.as_bytes().as_slice(),
                    body,
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_handoff(&self, id: &ObjectId) -> Result<Option<PackageHandoff>> {
        let id = *id;

        self.blocking(move |conn| {
            let body: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT body FROM package_handoffs WHERE handoff_id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            body.map(|b| codec::decode(&b)).transpose()
        })
        .await
    }

    async fn take_handoff(&self, id: &ObjectId) -> Result<Option<PackageHandoff>> {
        let id = *id;

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let body: Option<Vec<u8>> = tx
                .query_row(
                    "SELECT body FROM package_handoffs WHERE handoff_id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(body) = body else {
                return Ok(None);
            };
            tx.execute(
                "DELETE FROM package_handoffs WHERE handoff_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            tx.commit()?;

            codec::decode(&body).map(Some)
        })
        .await
    }
}
