//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use ownership_kernel_core::{ObjectId, PackageId};
use ownership_kernel_perms::{Namespace, PackageHandoff};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Namespaces indexed by id.
    namespaces: BTreeMap<ObjectId, Namespace>,

    /// Every claimed package and the namespace holding it, if any.
    packages: BTreeMap<PackageId, Option<ObjectId>>,

    /// Pending handoffs, CBOR encoded since handoffs cannot be cloned.
    handoffs: HashMap<ObjectId, Vec<u8>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Task(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Task(format!("lock poisoned: {e}")))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_namespace(&self, namespace: &Namespace) -> Result<InsertResult> {
        let mut inner = self.write()?;
        let id = namespace.id();

        if inner.namespaces.contains_key(&id) {
            return Ok(InsertResult::AlreadyExists);
        }

        for package in namespace.packages() {
            if let Some(existing) = inner.packages.get(package) {
                return Ok(InsertResult::PackageConflict {
                    package: *package,
                    existing: *existing,
                });
            }
        }

        for package in namespace.packages() {
            inner.packages.insert(*package, Some(id));
        }
        inner.namespaces.insert(id, namespace.clone());

        Ok(InsertResult::Inserted)
    }

    async fn get_namespace(&self, id: &ObjectId) -> Result<Option<Namespace>> {
        let inner = self.read()?;
        Ok(inner.namespaces.get(id).cloned())
    }

    async fn update_namespace(&self, namespace: &Namespace) -> Result<()> {
        let mut inner = self.write()?;
        let id = namespace.id();

        let previous = inner
            .namespaces
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("namespace {id}")))?
            .packages()
            .clone();

        for package in namespace.packages() {
            if let Some(Some(existing)) = inner.packages.get(package) {
                if *existing != id {
                    return Err(StoreError::Conflict {
                        package: package.to_string(),
                        existing: existing.to_string(),
                    });
                }
            }
        }

        for package in previous.difference(namespace.packages()) {
            inner.packages.insert(*package, None);
        }
        for package in namespace.packages() {
            inner.packages.insert(*package, Some(id));
        }
        inner.namespaces.insert(id, namespace.clone());

        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<ObjectId>> {
        let inner = self.read()?;
        Ok(inner.namespaces.keys().copied().collect())
    }

    async fn namespace_for_package(&self, package: &PackageId) -> Result<Option<ObjectId>> {
        let inner = self.read()?;
        Ok(inner.packages.get(package).copied().flatten())
    }

    async fn is_package_claimed(&self, package: &PackageId) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner.packages.contains_key(package))
    }

    async fn put_handoff(&self, handoff: &PackageHandoff) -> Result<()> {
        let body = codec::encode(handoff)?;
        let mut inner = self.write()?;
        inner.handoffs.insert(handoff.id(), body);
        Ok(())
    }

    async fn get_handoff(&self, id: &ObjectId) -> Result<Option<PackageHandoff>> {
        let inner = self.read()?;
        inner
            .handoffs
            .get(id)
            .map(|body| codec::decode(body))
            .transpose()
    }

    async fn take_handoff(&self, id: &ObjectId) -> Result<Option<PackageHandoff>> {
        let mut inner = self.write()?;
        inner
            .handoffs
            .remove(id)
            .map(|body| codec::decode(&body))
            .transpose()
    }
}
