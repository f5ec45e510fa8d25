//! Identity-derivation vectors.
//!
//! Each vector names a type and records the identities derived from it:
//! the type's own address and the witness address of its module. Exported
//! as JSON so other hosts can check their derivation against ours.

use serde::{Deserialize, Serialize};

use ownership_kernel_core::{address_of, witness_identity, Identity, Keypair, TypeName};

/// A type-name derivation vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityVector {
    /// Human-readable name for the vector.
    pub name: String,
    /// Canonical type name.
    pub type_name: String,
    /// `address_of(type_name)`, hex.
    pub address: String,
    /// Witness identity of the type's module, hex.
    pub witness: String,
}

/// A signer-derivation vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerVector {
    /// Ed25519 seed, hex.
    pub seed: String,
    /// Public key, hex.
    pub public_key: String,
    /// Signer identity, hex.
    pub identity: String,
}

const TYPE_NAMES: &[(&str, &str)] = &[
    ("admin permission", "0x1::permissions::ADMIN"),
    ("manager permission", "0x1::permissions::MANAGER"),
    ("single-use permission", "0x1::permissions::SINGLE_USE"),
    ("edit permission", "0xb10c::post::EDIT"),
    ("publish permission", "0xb10c::post::PUBLISH"),
    ("module witness", "0xb10c::post::Witness"),
    ("generic type", "0x2::coin::Coin<0x2::sui::SUI>"),
];

const SEEDS: &[[u8; 32]] = &[[0x00; 32], [0x42; 32], [0xff; 32]];

/// Compute the vector for one type name.
pub fn identity_vector(name: &str, type_name: &str) -> IdentityVector {
    let witness = witness_identity(type_name)
        .unwrap_or_else(|e| panic!("vector {name}: {e}"));

    IdentityVector {
        name: name.to_string(),
        type_name: type_name.to_string(),
        address: address_of(type_name).to_hex(),
        witness: witness.to_hex(),
    }
}

/// Get all type-name vectors.
pub fn all_vectors() -> Vec<IdentityVector> {
    TYPE_NAMES
        .iter()
        .map(|(name, type_name)| identity_vector(name, type_name))
        .collect()
}

/// Get all signer vectors.
pub fn signer_vectors() -> Vec<SignerVector> {
    SEEDS
        .iter()
        .map(|seed| {
            let keypair = Keypair::from_seed(seed);
            SignerVector {
                seed: hex::encode(seed),
                public_key: keypair.public_key().to_hex(),
                identity: keypair.identity().to_hex(),
            }
        })
        .collect()
}

/// Export every vector as pretty JSON.
pub fn export_json() -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct Export {
        types: Vec<IdentityVector>,
        signers: Vec<SignerVector>,
    }

    serde_json::to_string_pretty(&Export {
        types: all_vectors(),
        signers: signer_vectors(),
    })
}

/// Recompute `vector` and report whether it still matches.
pub fn verify_vector(vector: &IdentityVector) -> bool {
    *vector == identity_vector(&vector.name, &vector.type_name)
}

/// Parse a hex identity from a vector field.
pub fn vector_identity(hex: &str) -> Identity {
    Identity::from_hex(hex).unwrap_or_else(|e| panic!("vector identity {hex}: {e}"))
}
