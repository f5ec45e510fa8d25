//! Publish receipts.
//!
//! The host hands out exactly one receipt per package publish, to the
//! publisher. Possession of the receipt is the proof that the holder
//! published the package; modules record that they consumed it by attaching
//! dynamic fields. Fields on a receipt are append-only: once attached, a
//! field can never be removed or replaced.

use serde::{Deserialize, Serialize};

use crate::dynamic_field::DynamicFields;
use crate::error::CoreError;
use crate::identity::TypeIdentity;
use crate::types::{Identity, PackageId};

/// Proof of publishing a package.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    package: PackageId,
    fields: DynamicFields,
}

impl PublishReceipt {
    /// Issue the receipt for a freshly published package.
    pub fn new(package: PackageId) -> Self {
        Self {
            package,
            fields: DynamicFields::new(),
        }
    }

    /// The published package.
    pub fn package(&self) -> PackageId {
        self.package
    }

    /// The identity of the published package.
    pub fn package_identity(&self) -> Identity {
        self.package.identity()
    }

    /// Fields attached to this receipt.
    pub fn fields(&self) -> &DynamicFields {
        &self.fields
    }

    /// Attach a permanent field. Fails if a field with the same name and
    /// value type is already attached.
    pub fn attach<V>(&mut self, name: &str, value: &V) -> Result<(), CoreError>
    where
        V: TypeIdentity + Serialize,
    {
        self.fields.add(name, value)
    }
}
