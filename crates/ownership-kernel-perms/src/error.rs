//! Error types for the permissions module.

use thiserror::Error;

use ownership_kernel_core::{Identity, PackageId};

use crate::permission::PermissionId;

/// Errors that can occur during permission operations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The agent has no role in the RBAC.
    #[error("unknown agent: {0}")]
    UnknownAgent(Identity),

    /// A reserved permission was offered as a partial grant.
    #[error("reserved permission in partial grant: {0}")]
    ReservedPermissionInPartialGrant(PermissionId),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The publish receipt was already consumed by a namespace.
    #[error("package already claimed: {0}")]
    PackageAlreadyClaimed(PackageId),

    /// The package is not part of the namespace.
    #[error("package not found in namespace: {0}")]
    PackageNotFound(PackageId),

    /// Core error.
    #[error("core error: {0}")]
    CoreError(#[from] ownership_kernel_core::CoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
