//! Error types for the Kernel.

use ownership_kernel_core::{ObjectId, PackageId};
use ownership_kernel_perms::PermsError;
use ownership_kernel_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Authorization or delegation error.
    #[error("permission error: {0}")]
    Permission(#[from] PermsError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Namespace not found.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(ObjectId),

    /// Package handoff not found (never created, or already attached).
    #[error("package handoff not found: {0}")]
    HandoffNotFound(ObjectId),

    /// The package was claimed into a namespace before.
    #[error("package already claimed: {0}")]
    PackageAlreadyClaimed(PackageId),

    /// A configured namespace limit would be exceeded.
    #[error("namespace {namespace} would exceed the limit of {limit} {kind}")]
    LimitExceeded {
        namespace: ObjectId,
        kind: &'static str,
        limit: usize,
    },

    /// Not authorized.
    #[error("not authorized: {0}")]
    NotAuthorized(String),
}

impl KernelError {
    /// Whether this error is an authorization denial rather than a fault.
    pub fn is_denied(&self) -> bool {
        matches!(
            self,
            KernelError::NotAuthorized(_) | KernelError::Permission(PermsError::PermissionDenied(_))
        )
    }
}

/// Result type for Kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
