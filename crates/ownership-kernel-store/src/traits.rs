//! Store trait: the abstract interface for namespace persistence.
//!
//! This trait allows the kernel to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use ownership_kernel_core::{ObjectId, PackageId};
use ownership_kernel_perms::{Namespace, PackageHandoff};

use crate::error::Result;

/// Result of inserting a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// Namespace was inserted successfully.
    Inserted,
    /// A namespace with the same id already exists (nothing written).
    AlreadyExists,
    /// One of the namespace's packages was claimed before (nothing written).
    PackageConflict {
        /// The package that was already claimed.
        package: PackageId,
        /// Where the package currently lives; `None` while in transit.
        existing: Option<ObjectId>,
    },
}

/// The Store trait: async interface for namespace persistence.
///
/// # Design Notes
///
/// - **Claimed packages are permanent**: once a package has been stored in a
///   namespace it stays claimed, even while detached in a handoff. This backs
///   the publish-receipt rule with a second, store-level check.
/// - **Package index**: every package maps to the namespace currently holding
///   it, or to nothing while in transit.
/// - **Handoffs** are stored until taken; taking one removes it.
/// - Each method is atomic on its own. Callers compose them under the
///   single-writer-per-namespace assumption of the host.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Namespace Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a newly created namespace and claim its packages.
    async fn insert_namespace(&self, namespace: &Namespace) -> Result<InsertResult>;

    /// Get a namespace by id.
    async fn get_namespace(&self, id: &ObjectId) -> Result<Option<Namespace>>;

    /// Replace a stored namespace and re-index its packages.
    ///
    /// Fails with `NotFound` if the namespace was never inserted, and with
    /// `Conflict` if it lists a package located in another namespace.
    async fn update_namespace(&self, namespace: &Namespace) -> Result<()>;

    /// List all namespace ids.
    async fn list_namespaces(&self) -> Result<Vec<ObjectId>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Package Index
    // ─────────────────────────────────────────────────────────────────────────

    /// The namespace currently holding `package`.
    async fn namespace_for_package(&self, package: &PackageId) -> Result<Option<ObjectId>>;

    /// Whether `package` was ever claimed into a namespace.
    async fn is_package_claimed(&self, package: &PackageId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Handoff Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a package handoff.
    async fn put_handoff(&self, handoff: &PackageHandoff) -> Result<()>;

    /// Get a handoff without removing it.
    async fn get_handoff(&self, id: &ObjectId) -> Result<Option<PackageHandoff>>;

    /// Remove and return a handoff.
    async fn take_handoff(&self, id: &ObjectId) -> Result<Option<PackageHandoff>>;
}
