//! Strong type definitions for the Ownership Kernel.
//!
//! All identifiers are 32-byte newtypes so an object id can never be passed
//! where a signer address is expected without an explicit conversion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parse a 32-byte value from hex, with or without a `0x` prefix.
fn parse_hex32(s: &str) -> Result<[u8; 32], hex::FromHexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s)?;
    if bytes.len() != 32 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// A 32-byte address-shaped identity.
///
/// An identity is one of:
/// - a transaction signer address (see [`Identity::from_public_key`]),
/// - the address image of an object id (an object id *is* an address),
/// - the address image of a type's canonical name (see [`crate::identity`]).
///
/// The three categories share one namespace; collisions between them are
/// only as likely as a Blake3 collision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity(pub [u8; 32]);

impl Identity {
    /// Create a new Identity from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string (no prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string. A leading `0x` is accepted.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        parse_hex32(s).map(Self)
    }

    /// The zero identity. Never a valid signer.
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity(0x{})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Identity {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Identity {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// The unique id of a host object (namespace, handoff, capability, ...).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub [u8; 32]);

impl ObjectId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Allocate a fresh random object id.
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string. A leading `0x` is accepted.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        parse_hex32(s).map(Self)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId(0x{})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<ObjectId> for Identity {
    fn from(id: ObjectId) -> Self {
        Identity(id.0)
    }
}

/// The id of a published package.
///
/// Package ids are addresses, so a package's identity is its id's byte image.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageId(pub [u8; 32]);

impl PackageId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string. A leading `0x` is accepted.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        parse_hex32(s).map(Self)
    }

    /// The identity this package acts as.
    pub fn identity(&self) -> Identity {
        Identity(self.0)
    }
}

impl fmt::Debug for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageId(0x{})", &self.to_hex()[..16])
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<PackageId> for Identity {
    fn from(id: PackageId) -> Self {
        Identity(id.0)
    }
}
