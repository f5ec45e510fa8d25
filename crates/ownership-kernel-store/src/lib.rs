//! # Ownership Kernel Store
//!
//! Storage abstraction for the Ownership Kernel. Provides a trait-based interface
//! for namespace persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts namespace storage behind the [`Store`] trait,
//! allowing the kernel to be storage-agnostic. The primary implementation
//! is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of inserting a namespace
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ownership_kernel_core::{Identity, PackageId, PublishReceipt};
//! use ownership_kernel_perms::Namespace;
//! use ownership_kernel_store::{InsertResult, SqliteStore, Store};
//!
//! async fn example() -> ownership_kernel_store::Result<()> {
//!     let store = SqliteStore::open("kernel.db")?;
//!
//!     let mut receipt = PublishReceipt::new(PackageId::from_bytes([7; 32]));
//!     let owner = Identity::from_bytes([1; 32]);
//!     let namespace = Namespace::create_from_package(&mut receipt, owner).unwrap();
//!
//!     assert_eq!(store.insert_namespace(&namespace).await?, InsertResult::Inserted);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent inserts**: Inserting the same namespace twice returns `AlreadyExists`
//! - **Claimed packages**: A package claimed once can never seed another namespace
//! - **Handoffs**: Detached packages are stored until the holder attaches them

pub mod codec;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, Store};
