//! Cryptographic primitives for the Ownership Kernel.
//!
//! Wraps Ed25519 signer keys with strong types and derives signer addresses
//! from public keys.

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Identity;

/// Domain tag for signer address derivation.
const SIGNER_DOMAIN: &[u8] = b"ownership-signer-v0:";

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", &self.to_hex()[..16])
    }
}

impl Identity {
    /// Derive the signer address for a public key.
    ///
    /// `Blake3(SIGNER_DOMAIN || public_key)`.
    pub fn from_public_key(public_key: &Ed25519PublicKey) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(SIGNER_DOMAIN);
        hasher.update(&public_key.0);
        Identity(*hasher.finalize().as_bytes())
    }
}

/// A signer keypair.
///
/// This wraps ed25519-dalek's SigningKey. The host environment verifies the
/// transaction signature; the kernel only ever sees the resulting address.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// The address this keypair signs transactions as.
    pub fn identity(&self) -> Identity {
        Identity::from_public_key(&self.public_key())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}
