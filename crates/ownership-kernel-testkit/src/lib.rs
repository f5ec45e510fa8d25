//! # Ownership Kernel Testkit
//!
//! Testing utilities for the Ownership Kernel.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Identity vectors**: Type and signer derivations, exportable as JSON
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Signers, sample permissions and publish receipts
//!
//! ## Identity Vectors
//!
//! ```rust
//! use ownership_kernel_testkit::vectors::{all_vectors, verify_vector};
//!
//! for vector in all_vectors() {
//!     assert!(verify_vector(&vector));
//!     println!("{}: {}", vector.type_name, vector.address);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ownership_kernel_core::Identity;
//! use ownership_kernel_perms::Rbac;
//! use ownership_kernel_testkit::generators::{apply_rbac_op, RbacOp};
//!
//! proptest! {
//!     #[test]
//!     fn principal_never_changes(ops: Vec<RbacOp>) {
//!         let mut rbac = Rbac::new(Identity::ZERO);
//!         for op in &ops {
//!             apply_rbac_op(&mut rbac, op);
//!         }
//!         prop_assert_eq!(rbac.principal(), Identity::ZERO);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use ownership_kernel_testkit::fixtures::{publish, TestFixture};
//!
//! let owner = TestFixture::new();
//! let namespace = owner.create_namespace(&mut publish(0x50));
//! let admin = owner.admin_of(&namespace);
//! assert!(admin.is_signed_by(&namespace.principal()));
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, publish, Edit, Moderate, Publish, TestFixture};
pub use generators::{apply_rbac_op, RbacOp};
pub use vectors::{all_vectors, export_json, signer_vectors, verify_vector, IdentityVector, SignerVector};
