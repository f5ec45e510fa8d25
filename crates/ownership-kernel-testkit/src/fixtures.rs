//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use ownership_kernel_core::{Identity, Keypair, PackageId, PublishReceipt, TypeIdentity};
use ownership_kernel_perms::{Admin, Namespace, Permission, TxAuthority};

/// Ordinary permission used throughout the tests.
pub struct Edit;

impl TypeIdentity for Edit {
    const TYPE_NAME: &'static str = "0xb10c::post::EDIT";
}

impl Permission for Edit {}

/// Second ordinary permission, from the same module as [`Edit`].
pub struct Publish;

impl TypeIdentity for Publish {
    const TYPE_NAME: &'static str = "0xb10c::post::PUBLISH";
}

impl Permission for Publish {}

/// Ordinary permission from another package.
pub struct Moderate;

impl TypeIdentity for Moderate {
    const TYPE_NAME: &'static str = "0xf0c5::forum::MODERATE";
}

impl Permission for Moderate {}

/// A test signer.
pub struct TestFixture {
    pub keypair: Keypair,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self {
            keypair: Keypair::generate(),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(&seed),
        }
    }

    /// The signer's identity.
    pub fn identity(&self) -> Identity {
        self.keypair.identity()
    }

    /// An authority signed by this fixture alone.
    pub fn authority(&self) -> TxAuthority {
        TxAuthority::begin(self.identity())
    }

    /// Create a namespace owned by this fixture.
    pub fn create_namespace(&self, receipt: &mut PublishReceipt) -> Namespace {
        Namespace::create_from_package(receipt, self.identity())
            .unwrap_or_else(|e| panic!("fixture namespace: {e}"))
    }

    /// Log in to `namespace` as admin.
    pub fn admin_of(&self, namespace: &Namespace) -> TxAuthority {
        namespace
            .assert_login::<Admin>(self.authority())
            .unwrap_or_else(|e| panic!("fixture admin login: {e}"))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh publish receipt for the package `[n; 32]`.
pub fn publish(n: u8) -> PublishReceipt {
    PublishReceipt::new(PackageId::from_bytes([n; 32]))
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}
