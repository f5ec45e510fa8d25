//! End-to-end authority flows through the kernel, backed by SQLite.

use proptest::prelude::*;

use ownership_kernel::core::{Identity, ObjectId, TypeIdentity};
use ownership_kernel::perms::{Admin, Manager, SingleUse, TxAuthority};
use ownership_kernel::store::{SqliteStore, Store};
use ownership_kernel::{Kernel, KernelConfig, KernelError};
use ownership_kernel_testkit::{multi_party_fixtures, publish, Edit, Moderate, Publish, TestFixture};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn kernel() -> Kernel<SqliteStore> {
    init_tracing();
    Kernel::new(SqliteStore::open_memory().unwrap(), KernelConfig::default())
}

/// A resource module that vouches for calls with its witness.
mod post {
    pub struct Witness(());

    pub struct Post;

    pub fn witness() -> Witness {
        Witness(())
    }
}

mod forum {
    #[allow(dead_code)]
    pub struct Thread;
}

/// Borrows the `post` module's canonical witness name.
struct Impostor;

impl TypeIdentity for Impostor {
    const TYPE_NAME: &'static str = "0xb10c::post::Witness";
}

#[tokio::test]
async fn test_editor_and_manager_login() {
    let kernel = kernel();
    let [owner, editor, manager]: [TestFixture; 3] =
        multi_party_fixtures(3).try_into().ok().unwrap();

    let mut receipt = publish(0x50);
    let ns = kernel.claim_package(&mut receipt, owner.identity()).await.unwrap();
    let principal = ns.principal();
    assert_ne!(principal, owner.identity());

    let admin = kernel.login::<Admin>(&ns.id(), owner.authority()).await.unwrap();
    kernel
        .set_role_for_agent(&ns.id(), editor.identity(), "editor", &admin)
        .await
        .unwrap();
    kernel
        .grant_permission_to_role::<Edit>(&ns.id(), "editor", &admin)
        .await
        .unwrap();
    kernel
        .grant_manager_role_for_agent(&ns.id(), manager.identity(), &admin)
        .await
        .unwrap();

    // Editors hold exactly what their role grants.
    let auth = kernel.login::<Edit>(&ns.id(), editor.authority()).await.unwrap();
    assert!(auth.has_permission::<Edit>(&principal));
    assert!(!auth.has_permission::<Publish>(&principal));
    assert!(!auth.is_signed_by(&principal));
    let err = kernel
        .login::<Publish>(&ns.id(), editor.authority())
        .await
        .unwrap_err();
    assert!(err.is_denied());

    // Managers hold everything but admin.
    let auth = kernel.login::<Moderate>(&ns.id(), manager.authority()).await.unwrap();
    assert!(auth.is_manager(&principal));
    assert!(!auth.has_admin_permission(&principal));
    assert!(kernel
        .grant_admin_role_for_agent(&ns.id(), manager.identity(), &auth)
        .await
        .is_err());
    assert!(kernel.login::<Manager>(&ns.id(), manager.authority()).await.is_ok());
}

#[tokio::test]
async fn test_joint_login_counts_signers() {
    let kernel = kernel();
    let parties = multi_party_fixtures(3);
    let mut receipt = publish(0x51);
    let ns = kernel
        .claim_package(&mut receipt, parties[0].identity())
        .await
        .unwrap();

    let signers: Vec<Identity> = parties.iter().map(TestFixture::identity).collect();
    let joint = parties[0].authority().merge(parties[1].authority());
    assert_eq!(joint.number_of_signers(&signers), 2);
    assert!(joint.has_k_of_n(&signers, 2));
    assert!(!joint.has_k_of_n(&signers, 3));

    // The owner's signature is enough to act for the namespace.
    let auth = kernel.login::<Edit>(&ns.id(), joint).await.unwrap();
    assert!(auth.is_signed_by(&ns.principal()));
    assert!(auth.is_signed_by(&signers[1]));
}

#[tokio::test]
async fn test_package_moves_between_namespaces() {
    let kernel = kernel();
    let alice = TestFixture::new();
    let bob = TestFixture::new();

    let source = kernel.claim_package(&mut publish(0x60), alice.identity()).await.unwrap();
    let target = kernel.claim_package(&mut publish(0x61), bob.identity()).await.unwrap();
    let package = publish(0x60).package();

    let alice_admin = kernel.login::<Admin>(&source.id(), alice.authority()).await.unwrap();
    let bob_admin = kernel.login::<Admin>(&target.id(), bob.authority()).await.unwrap();

    // Bob cannot pull the package out himself.
    assert!(kernel
        .detach_package(&source.id(), package, bob.identity(), &bob_admin)
        .await
        .unwrap_err()
        .is_denied());

    let handoff = kernel
        .detach_package(&source.id(), package, bob.identity(), &alice_admin)
        .await
        .unwrap();
    assert!(kernel.namespace_for_package(&package).await.unwrap().is_none());

    // Only the holder may attach it.
    let err = kernel
        .attach_package(&target.id(), &handoff, &alice_admin)
        .await
        .unwrap_err();
    assert!(matches!(err, KernelError::NotAuthorized(_)));

    let target = kernel.attach_package(&target.id(), &handoff, &bob_admin).await.unwrap();
    assert!(target.contains_package(&package));
    assert_eq!(
        kernel.namespace_for_package(&package).await.unwrap().map(|ns| ns.id()),
        Some(target.id())
    );

    // The handoff is spent.
    assert!(matches!(
        kernel.attach_package(&target.id(), &handoff, &bob_admin).await,
        Err(KernelError::HandoffNotFound(id)) if id == handoff
    ));

    // Logging in through the package now reaches the new principal.
    let auth = kernel.login_for_package::<Edit>(&package, bob.authority()).await.unwrap();
    assert_eq!(auth.namespace_principal(&package), Some(target.principal()));
    assert!(auth.has_package_permission::<Edit>(&package));
    assert!(kernel
        .login_for_package::<Edit>(&package, alice.authority())
        .await
        .is_err());
}

#[tokio::test]
async fn test_detached_package_stays_claimed() {
    let kernel = kernel();
    let alice = TestFixture::new();
    let ns = kernel.claim_package(&mut publish(0x70), alice.identity()).await.unwrap();
    let admin = kernel.login::<Admin>(&ns.id(), alice.authority()).await.unwrap();

    kernel
        .detach_package(&ns.id(), publish(0x70).package(), alice.identity(), &admin)
        .await
        .unwrap();

    // A fresh receipt for the same package cannot start a namespace.
    let err = kernel
        .claim_package(&mut publish(0x70), alice.identity())
        .await
        .unwrap_err();
    assert!(matches!(err, KernelError::PackageAlreadyClaimed(_)));
}

#[tokio::test]
async fn test_add_package_from_receipt() {
    let kernel = kernel();
    let alice = TestFixture::new();
    let ns = kernel.claim_package(&mut publish(0x80), alice.identity()).await.unwrap();
    let admin = kernel.login::<Admin>(&ns.id(), alice.authority()).await.unwrap();

    let mut receipt = publish(0x81);
    let ns = kernel
        .add_package_from_receipt(&ns.id(), &mut receipt, &admin)
        .await
        .unwrap();
    assert_eq!(ns.packages().len(), 2);

    // The consumed receipt is refused everywhere.
    assert!(kernel.claim_package(&mut receipt, alice.identity()).await.is_err());

    let auth = kernel.login::<Edit>(&ns.id(), alice.authority()).await.unwrap();
    assert!(auth.has_package_permission::<Edit>(&receipt.package()));
}

#[tokio::test]
async fn test_package_limit() {
    init_tracing();
    let config = KernelConfig {
        max_packages_per_namespace: 1,
        ..KernelConfig::default()
    };
    let kernel = Kernel::new(SqliteStore::open_memory().unwrap(), config);
    let alice = TestFixture::new();
    let ns = kernel.claim_package(&mut publish(0x90), alice.identity()).await.unwrap();
    let admin = kernel.login::<Admin>(&ns.id(), alice.authority()).await.unwrap();

    let mut receipt = publish(0x91);
    let err = kernel
        .add_package_from_receipt(&ns.id(), &mut receipt, &admin)
        .await
        .unwrap_err();
    assert!(matches!(err, KernelError::LimitExceeded { kind: "packages", .. }));
    assert!(!kernel.store().is_package_claimed(&receipt.package()).await.unwrap());

    // The rejected receipt is still good for a namespace of its own.
    assert!(kernel.claim_package(&mut receipt, alice.identity()).await.is_ok());
}

#[tokio::test]
async fn test_single_use_token() {
    let kernel = kernel();
    let [owner, issuer, stranger]: [TestFixture; 3] =
        multi_party_fixtures(3).try_into().ok().unwrap();
    let ns = kernel.claim_package(&mut publish(0xa0), owner.identity()).await.unwrap();
    let admin = kernel.login::<Admin>(&ns.id(), owner.authority()).await.unwrap();

    kernel.set_role_for_agent(&ns.id(), issuer.identity(), "issuer", &admin).await.unwrap();
    kernel.grant_permission_to_role::<Edit>(&ns.id(), "issuer", &admin).await.unwrap();
    kernel
        .grant_permission_to_role::<SingleUse>(&ns.id(), "issuer", &admin)
        .await
        .unwrap();

    let auth = kernel.login::<SingleUse>(&ns.id(), issuer.authority()).await.unwrap();
    let token = kernel.issue_single_use::<Edit>(&ns.id(), &auth).await.unwrap();
    assert!(kernel.issue_single_use::<Publish>(&ns.id(), &auth).await.is_err());

    // The stranger redeems the token once.
    let redeemed = token.redeem(stranger.authority());
    assert!(redeemed.has_permission::<Edit>(&ns.principal()));
    assert!(redeemed.is_signed_by(&stranger.identity()));
    assert!(!redeemed.has_permission::<Publish>(&ns.principal()));
}

#[tokio::test]
async fn test_module_and_object_authority() {
    let witness_auth = TxAuthority::begin_with_type_witness(&post::witness()).unwrap();
    assert!(witness_auth.is_signed_by_module::<post::Post>().unwrap());
    assert!(witness_auth.is_signed_by_module::<post::Witness>().unwrap());
    assert!(!witness_auth.is_signed_by_module::<forum::Thread>().unwrap());
    let module = Identity::witness_of::<post::Post>().unwrap();
    assert!(witness_auth.has_permission::<Edit>(&module));

    // A canonical name alone does not make a module witness.
    assert!(TxAuthority::begin_with_type_witness(&Impostor).is_err());
    assert!(TxAuthority::begin_with_type_witness(&post::Post).is_err());

    let object = ObjectId::from_bytes([0xcc; 32]);
    let auth = TxAuthority::begin_with_object_capability(object);
    assert!(auth.is_signed_by_object(&object));
    assert!(auth.is_signed_by(&Identity::from(object)));
    assert!(auth.is_signed_by_optional(None));
    assert!(!auth.is_signed_by_optional(Some(&Identity::ZERO)));
}

#[tokio::test]
async fn test_state_survives_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kernel.db");
    let alice = TestFixture::new();
    let bob = TestFixture::new();

    let ns_id = {
        let kernel = Kernel::new(SqliteStore::open(&path).unwrap(), KernelConfig::default());
        let ns = kernel.claim_package(&mut publish(0xb0), alice.identity()).await.unwrap();
        let admin = kernel.login::<Admin>(&ns.id(), alice.authority()).await.unwrap();
        kernel.set_role_for_agent(&ns.id(), bob.identity(), "editor", &admin).await.unwrap();
        kernel.grant_permission_to_role::<Edit>(&ns.id(), "editor", &admin).await.unwrap();
        ns.id()
    };

    let kernel = Kernel::new(SqliteStore::open(&path).unwrap(), KernelConfig::default());
    assert_eq!(kernel.list_namespaces().await.unwrap(), vec![ns_id]);
    assert!(kernel.login::<Edit>(&ns_id, bob.authority()).await.is_ok());
}

fn permission_flags() -> impl Strategy<Value = [bool; 3]> {
    any::<[bool; 3]>()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn login_grants_exactly_the_role(flags in permission_flags()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let kernel = Kernel::new(SqliteStore::open_memory().unwrap(), KernelConfig::default());
            let owner = TestFixture::with_seed([1; 32]);
            let agent = TestFixture::with_seed([2; 32]);
            let ns = kernel.claim_package(&mut publish(0xc0), owner.identity()).await.unwrap();
            let admin = kernel.login::<Admin>(&ns.id(), owner.authority()).await.unwrap();
            kernel.set_role_for_agent(&ns.id(), agent.identity(), "role", &admin).await.unwrap();

            if flags[0] {
                kernel.grant_permission_to_role::<Edit>(&ns.id(), "role", &admin).await.unwrap();
            }
            if flags[1] {
                kernel.grant_permission_to_role::<Publish>(&ns.id(), "role", &admin).await.unwrap();
            }
            if flags[2] {
                kernel.grant_permission_to_role::<Moderate>(&ns.id(), "role", &admin).await.unwrap();
            }

            let auth = kernel.claim(&ns.id(), &[agent.identity()], agent.authority()).await.unwrap();
            let principal = ns.principal();
            assert_eq!(auth.has_permission::<Edit>(&principal), flags[0]);
            assert_eq!(auth.has_permission::<Publish>(&principal), flags[1]);
            assert_eq!(auth.has_permission::<Moderate>(&principal), flags[2]);
            assert_eq!(
                kernel.login::<Edit>(&ns.id(), agent.authority()).await.is_ok(),
                flags[0]
            );
            assert!(!auth.has_admin_permission(&principal));
        });
    }
}
