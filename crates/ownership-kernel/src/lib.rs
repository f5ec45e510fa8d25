//! # Ownership Kernel
//!
//! The unified API for the Ownership system: namespaces, delegated
//! permissions and per-call authority.
//!
//! ## Overview
//!
//! The Ownership Kernel provides a library for deciding who may act on
//! whose behalf:
//!
//! - **Identities**: addresses for signers, objects, packages and types
//! - **Namespaces**: role-based delegation bound to a published package
//! - **Authority**: the set of principals a call acts for, built per call
//! - **Single-use permissions**: one-shot bearer grants
//!
//! ## Key Concepts
//!
//! - **Principal**: the identity permissions are exercised for. A namespace's
//!   principal is the identity of the package it was created from.
//! - **Agent**: an identity assigned a role in a namespace.
//! - **Login**: folding an agent's delegated permissions into an authority.
//! - **Handoff**: a package detached from one namespace, in transit to another.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ownership_kernel::{Kernel, KernelConfig};
//! use ownership_kernel::core::{Keypair, PackageId, PublishReceipt};
//! use ownership_kernel::perms::{Admin, TxAuthority};
//! use ownership_kernel::store::SqliteStore;
//!
//! async fn example() -> ownership_kernel::Result<()> {
//!     let owner = Keypair::generate().identity();
//!
//!     // Open storage and create the kernel
//!     let store = SqliteStore::open("kernel.db")?;
//!     let kernel = Kernel::new(store, KernelConfig::default());
//!
//!     // Claim a freshly published package
//!     let mut receipt = PublishReceipt::new(PackageId::from_bytes([0x50; 32]));
//!     let namespace = kernel.claim_package(&mut receipt, owner).await?;
//!
//!     // Log in as the namespace admin
//!     let admin = kernel
//!         .login::<Admin>(&namespace.id(), TxAuthority::begin(owner))
//!         .await?;
//!     assert!(admin.is_signed_by(&namespace.principal()));
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `ownership_kernel::core` - Core primitives (Identity, TypeName, etc.)
//! - `ownership_kernel::perms` - Permissions, namespaces and authority
//! - `ownership_kernel::store` - Storage abstraction and SQLite

pub mod error;
pub mod kernel;

// Re-export component crates
pub use ownership_kernel_core as core;
pub use ownership_kernel_perms as perms;
pub use ownership_kernel_store as store;

// Re-export main types for convenience
pub use error::{KernelError, Result};
pub use kernel::{Kernel, KernelConfig};

// Re-export commonly used types
pub use ownership_kernel_core::{Identity, Keypair, ObjectId, PackageId, PublishReceipt, TypeIdentity};
pub use ownership_kernel_perms::{
    Admin, Manager, Namespace, Permission, PermissionId, SingleUse, SingleUsePermission,
    TxAuthority,
};
