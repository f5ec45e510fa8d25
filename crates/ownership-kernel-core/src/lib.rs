//! # Ownership Kernel Core
//!
//! Pure primitives for the Ownership Kernel: identities, type names, dynamic
//! fields and publish receipts.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Identity`] - 32-byte address: a signer, an object, or a type
//! - [`ObjectId`], [`PackageId`] - host object and package ids
//! - [`TypeName`] - parsed `package::module::Struct` name
//! - [`TypeIdentity`] - marker trait for types with a canonical name
//! - [`DynamicFields`] - typed extensible fields keyed by (name, type)
//! - [`PublishReceipt`] - proof of publishing a package
//!
//! ## Identity Derivation
//!
//! Type names map to identities by hashing; see the [`identity`] module.

pub mod crypto;
pub mod dynamic_field;
pub mod error;
pub mod identity;
pub mod package;
pub mod types;

pub use crypto::{Ed25519PublicKey, Keypair};
pub use dynamic_field::{DynamicFields, FieldKey};
pub use error::CoreError;
pub use identity::{address_of, witness_identity, TypeIdentity, TypeName, WITNESS_STRUCT};
pub use package::PublishReceipt;
pub use types::{Identity, ObjectId, PackageId};
