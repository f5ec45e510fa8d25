//! # Ownership Kernel Permissions
//!
//! Capability-based authorization: who vouches for a call, and what they
//! may do on whose behalf.
//!
//! ## Overview
//!
//! A call starts with the identity of its signer. Further authority is
//! folded in from capability objects, module witnesses and namespace
//! delegation, producing a [`TxAuthority`]. Resource modules then ask the
//! authority set whether a permission is held for a principal.
//!
//! ## Key Concepts
//!
//! - **Permission**: a marker type; [`Admin`] and [`Manager`] are reserved
//! - **Rbac**: a principal's agent→role and role→permissions tables
//! - **Namespace**: an RBAC whose principal is a published package
//! - **TxAuthority**: the per-call authority set
//! - **SingleUsePermission**: a one-shot delegated permission
//!
//! ## Usage
//!
//! ```rust
//! use ownership_kernel_core::{Identity, PackageId, PublishReceipt, TypeIdentity};
//! use ownership_kernel_perms::{Namespace, Permission, TxAuthority};
//!
//! struct Edit;
//! impl TypeIdentity for Edit {
//!     const TYPE_NAME: &'static str = "0xb10c::post::EDIT";
//! }
//! impl Permission for Edit {}
//!
//! let owner = Identity::from_bytes([1; 32]);
//! let editor = Identity::from_bytes([2; 32]);
//!
//! let mut receipt = PublishReceipt::new(PackageId::from_bytes([0x50; 32]));
//! let mut namespace = Namespace::create_from_package(&mut receipt, owner).unwrap();
//!
//! let admin = namespace.assert_login::<ownership_kernel_perms::Admin>(TxAuthority::begin(owner)).unwrap();
//! namespace.set_role_for_agent(editor, "editor", &admin).unwrap();
//! namespace.grant_permission_to_role::<Edit>("editor", &admin).unwrap();
//!
//! let auth = namespace.assert_login::<Edit>(TxAuthority::begin(editor)).unwrap();
//! assert!(auth.has_permission::<Edit>(&namespace.principal()));
//! ```

pub mod authority;
pub mod error;
pub mod namespace;
pub mod permission;
pub mod rbac;
pub mod single_use;

pub use authority::TxAuthority;
pub use error::{PermsError, Result};
pub use namespace::{
    Namespace, NamespaceClaim, PackageHandoff, ReceiptClaim, NAMESPACE_CLAIM_FIELD,
};
pub use permission::{Admin, Manager, Permission, PermissionId, PermissionSet, SingleUse};
pub use rbac::{Rbac, ADMIN_ROLE, MANAGER_ROLE};
pub use single_use::SingleUsePermission;
