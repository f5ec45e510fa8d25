//! The Kernel: unified API for the Ownership system.
//!
//! The Kernel brings together storage and the authorization model into a
//! cohesive interface: it loads a namespace, applies one operation under
//! the caller's authority, checks the configured limits, and persists the
//! result. A failed call persists nothing.

use std::sync::Arc;

use ownership_kernel_core::{Identity, ObjectId, PackageId, PublishReceipt, TypeIdentity};
use ownership_kernel_perms::{Namespace, Permission, PermsError, SingleUsePermission, TxAuthority};
use ownership_kernel_store::{InsertResult, Store};

use crate::error::{KernelError, Result};

/// Configuration for the Kernel.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Maximum number of agents with a role in one namespace.
    pub max_agents_per_namespace: usize,
    /// Maximum number of roles in one namespace.
    pub max_roles_per_namespace: usize,
    /// Maximum number of packages in one namespace.
    pub max_packages_per_namespace: usize,
    /// Whether failed logins are logged at `warn` level.
    pub log_denied_logins: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_agents_per_namespace: 1024,
            max_roles_per_namespace: 256,
            max_packages_per_namespace: 64,
            log_denied_logins: true,
        }
    }
}

/// The main Kernel struct.
///
/// Provides a unified API for:
/// - Creating namespaces from publish receipts
/// - Administering namespace roles and permissions
/// - Moving packages between namespaces
/// - Building per-call authority through login
/// - Issuing single-use permissions
pub struct Kernel<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: KernelConfig,
}

impl<S: Store> Kernel<S> {
    /// Create a new kernel instance.
    pub fn new(store: S, config: KernelConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Namespace Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a namespace for a freshly published package.
    ///
    /// `owner` becomes the namespace's admin agent. Once the namespace is
    /// stored the receipt is marked as consumed and cannot seed another
    /// namespace; if storing fails the receipt stays usable.
    pub async fn claim_package(
        &self,
        receipt: &mut PublishReceipt,
        owner: Identity,
    ) -> Result<Namespace> {
        let package = receipt.package();
        if self.store.is_package_claimed(&package).await? {
            return Err(KernelError::PackageAlreadyClaimed(package));
        }

        let (namespace, claim) = Namespace::stage_from_package(receipt, owner)?;

        match self.store.insert_namespace(&namespace).await? {
            InsertResult::Inserted => {
                claim.commit()?;
                tracing::info!(
                    namespace = %namespace.id(),
                    package = %package,
                    owner = %owner,
                    "created namespace"
                );
                Ok(namespace)
            }
            InsertResult::PackageConflict { package, .. } => {
                Err(KernelError::PackageAlreadyClaimed(package))
            }
            InsertResult::AlreadyExists => Err(KernelError::Store(
                ownership_kernel_store::StoreError::InvalidData(format!(
                    "namespace id {} already in use",
                    namespace.id()
                )),
            )),
        }
    }

    /// Load a namespace.
    pub async fn namespace(&self, id: &ObjectId) -> Result<Namespace> {
        self.store
            .get_namespace(id)
            .await?
            .ok_or(KernelError::NamespaceNotFound(*id))
    }

    /// The namespace currently holding `package`, if any.
    pub async fn namespace_for_package(&self, package: &PackageId) -> Result<Option<Namespace>> {
        match self.store.namespace_for_package(package).await? {
            Some(id) => Ok(Some(self.namespace(&id).await?)),
            None => Ok(None),
        }
    }

    /// List all namespace ids.
    pub async fn list_namespaces(&self) -> Result<Vec<ObjectId>> {
        Ok(self.store.list_namespaces().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // RBAC Administration
    // ─────────────────────────────────────────────────────────────────────────

    /// Assign `role` to `agent`.
    pub async fn set_role_for_agent(
        &self,
        id: &ObjectId,
        agent: Identity,
        role: &str,
        auth: &TxAuthority,
    ) -> Result<Namespace> {
        self.update(id, "set_role_for_agent", |ns| {
            ns.set_role_for_agent(agent, role, auth)
        })
        .await
    }

    /// Make `agent` an admin of the namespace.
    pub async fn grant_admin_role_for_agent(
        &self,
        id: &ObjectId,
        agent: Identity,
        auth: &TxAuthority,
    ) -> Result<Namespace> {
        self.update(id, "grant_admin_role_for_agent", |ns| {
            ns.grant_admin_role_for_agent(agent, auth)
        })
        .await
    }

    /// Make `agent` a manager of the namespace.
    pub async fn grant_manager_role_for_agent(
        &self,
        id: &ObjectId,
        agent: Identity,
        auth: &TxAuthority,
    ) -> Result<Namespace> {
        self.update(id, "grant_manager_role_for_agent", |ns| {
            ns.grant_manager_role_for_agent(agent, auth)
        })
        .await
    }

    /// Remove `agent` from the namespace.
    pub async fn delete_agent(
        &self,
        id: &ObjectId,
        agent: &Identity,
        auth: &TxAuthority,
    ) -> Result<Namespace> {
        self.update(id, "delete_agent", |ns| ns.delete_agent(agent, auth))
            .await
    }

    /// Grant `P` to `role`.
    pub async fn grant_permission_to_role<P: Permission>(
        &self,
        id: &ObjectId,
        role: &str,
        auth: &TxAuthority,
    ) -> Result<Namespace> {
        self.update(id, "grant_permission_to_role", |ns| {
            ns.grant_permission_to_role::<P>(role, auth)
        })
        .await
    }

    /// Revoke `P` from `role`.
    pub async fn revoke_permission_from_role<P: Permission>(
        &self,
        id: &ObjectId,
        role: &str,
        auth: &TxAuthority,
    ) -> Result<Namespace> {
        self.update(id, "revoke_permission_from_role", |ns| {
            ns.revoke_permission_from_role::<P>(role, auth)
        })
        .await
    }

    /// Delete `role` together with its agents.
    pub async fn delete_role_and_agents(
        &self,
        id: &ObjectId,
        role: &str,
        auth: &TxAuthority,
    ) -> Result<Namespace> {
        self.update(id, "delete_role_and_agents", |ns| {
            ns.delete_role_and_agents(role, auth)
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Package Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Claim another freshly published package into an existing namespace.
    pub async fn add_package_from_receipt(
        &self,
        id: &ObjectId,
        receipt: &mut PublishReceipt,
        auth: &TxAuthority,
    ) -> Result<Namespace> {
        let package = receipt.package();
        if self.store.is_package_claimed(&package).await? {
            return Err(KernelError::PackageAlreadyClaimed(package));
        }

        let mut namespace = self.namespace(id).await?;
        let limit = self.config.max_packages_per_namespace;
        if namespace.packages().len() >= limit {
            return Err(KernelError::LimitExceeded {
                namespace: *id,
                kind: "packages",
                limit,
            });
        }

        let claim = namespace
            .stage_package_from_receipt(receipt, auth)
            .map_err(|e| self.denied(id, "add_package_from_receipt", e))?;
        self.check_limits(&namespace)?;
        self.store.update_namespace(&namespace).await?;
        claim.commit()?;

        tracing::info!(namespace = %id, package = %package, "added package");
        Ok(namespace)
    }

    /// Detach `package` from a namespace, handing it to `holder`.
    ///
    /// Returns the id of the stored handoff. The package belongs to no
    /// namespace until the holder attaches it with
    /// [`Kernel::attach_package`].
    pub async fn detach_package(
        &self,
        id: &ObjectId,
        package: PackageId,
        holder: Identity,
        auth: &TxAuthority,
    ) -> Result<ObjectId> {
        let mut namespace = self.namespace(id).await?;
        let handoff = namespace
            .remove_package(package, holder, auth)
            .map_err(|e| self.denied(id, "detach_package", e))?;
        let handoff_id = handoff.id();

        // The handoff is stored first so the package is never unreachable.
        self.store.put_handoff(&handoff).await?;
        self.store.update_namespace(&namespace).await?;

        tracing::info!(
            namespace = %id,
            package = %package,
            holder = %holder,
            handoff = %handoff_id,
            "detached package"
        );
        Ok(handoff_id)
    }

    /// Attach a detached package to a namespace.
    ///
    /// `auth` must carry the signature of the handoff's holder and admin
    /// authority over the destination namespace.
    pub async fn attach_package(
        &self,
        id: &ObjectId,
        handoff_id: &ObjectId,
        auth: &TxAuthority,
    ) -> Result<Namespace> {
        let handoff = self
            .store
            .get_handoff(handoff_id)
            .await?
            .ok_or(KernelError::HandoffNotFound(*handoff_id))?;

        if !auth.is_signed_by(&handoff.holder()) {
            tracing::warn!(
                namespace = %id,
                handoff = %handoff_id,
                "package handoff presented without its holder's signature"
            );
            return Err(KernelError::NotAuthorized(format!(
                "handoff {handoff_id} must be attached by {}",
                handoff.holder()
            )));
        }

        let package = handoff.package();
        let namespace = self
            .update(id, "attach_package", |ns| ns.add_package(handoff, auth))
            .await?;

        // Attached: the stored handoff is spent.
        self.store.take_handoff(handoff_id).await?;

        tracing::info!(namespace = %id, package = %package, "attached package");
        Ok(namespace)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authority
    // ─────────────────────────────────────────────────────────────────────────

    /// Log in to a namespace with every signer of `auth`, requiring `P`.
    pub async fn login<P: Permission>(
        &self,
        id: &ObjectId,
        auth: TxAuthority,
    ) -> Result<TxAuthority> {
        let namespace = self.namespace(id).await?;
        namespace.assert_login::<P>(auth).map_err(|e| {
            if self.config.log_denied_logins {
                tracing::warn!(namespace = %id, permission = P::TYPE_NAME, error = %e, "login denied");
            }
            KernelError::from(e)
        })
    }

    /// Log in to the namespace holding `package`, requiring `P`.
    pub async fn login_for_package<P: Permission>(
        &self,
        package: &PackageId,
        auth: TxAuthority,
    ) -> Result<TxAuthority> {
        let id = self
            .store
            .namespace_for_package(package)
            .await?
            .ok_or_else(|| {
                KernelError::NotAuthorized(format!("package {package} belongs to no namespace"))
            })?;
        self.login::<P>(&id, auth).await
    }

    /// Fold the delegated permissions of `candidates` into `auth`.
    pub async fn claim(
        &self,
        id: &ObjectId,
        candidates: &[Identity],
        auth: TxAuthority,
    ) -> Result<TxAuthority> {
        let namespace = self.namespace(id).await?;
        Ok(namespace.claim_permissions(candidates, auth))
    }

    /// Issue a single-use token for `P` on behalf of a namespace principal.
    pub async fn issue_single_use<P: Permission>(
        &self,
        id: &ObjectId,
        auth: &TxAuthority,
    ) -> Result<SingleUsePermission> {
        let namespace = self.namespace(id).await?;
        let token = SingleUsePermission::issue::<P>(namespace.principal(), auth)
            .map_err(|e| self.denied(id, "issue_single_use", e))?;

        tracing::debug!(namespace = %id, permission = P::TYPE_NAME, "issued single-use permission");
        Ok(token)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Load, mutate, check limits, persist.
    async fn update<F>(&self, id: &ObjectId, op: &'static str, f: F) -> Result<Namespace>
    where
        F: FnOnce(&mut Namespace) -> ownership_kernel_perms::Result<()>,
    {
        let mut namespace = self.namespace(id).await?;
        f(&mut namespace).map_err(|e| self.denied(id, op, e))?;
        self.check_limits(&namespace)?;

        self.store.update_namespace(&namespace).await?;
        tracing::debug!(namespace = %id, op, "namespace updated");
        Ok(namespace)
    }

    fn check_limits(&self, namespace: &Namespace) -> Result<()> {
        let checks = [
            (
                "agents",
                namespace.rbac().agent_count(),
                self.config.max_agents_per_namespace,
            ),
            (
                "roles",
                namespace.rbac().role_count(),
                self.config.max_roles_per_namespace,
            ),
            (
                "packages",
                namespace.packages().len(),
                self.config.max_packages_per_namespace,
            ),
        ];

        for (kind, count, limit) in checks {
            if count > limit {
                return Err(KernelError::LimitExceeded {
                    namespace: namespace.id(),
                    kind,
                    limit,
                });
            }
        }
        Ok(())
    }

    fn denied(&self, id: &ObjectId, op: &'static str, error: PermsError) -> KernelError {
        if matches!(error, PermsError::PermissionDenied(_)) {
            tracing::warn!(namespace = %id, op, error = %error, "administrative call denied");
        }
        KernelError::Permission(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use ownership_kernel_perms::{
        Admin, NamespaceClaim, PackageHandoff, SingleUse, NAMESPACE_CLAIM_FIELD,
    };
    use ownership_kernel_store::{MemoryStore, StoreError};

    struct Edit;
    impl TypeIdentity for Edit {
        const TYPE_NAME: &'static str = "0xb10c::post::EDIT";
    }
    impl Permission for Edit {}

    fn id(n: u8) -> Identity {
        Identity::from_bytes([n; 32])
    }

    fn package(n: u8) -> PackageId {
        PackageId::from_bytes([n; 32])
    }

    fn kernel() -> Kernel<MemoryStore> {
        Kernel::new(MemoryStore::new(), KernelConfig::default())
    }

    /// A memory store whose namespace writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> ownership_kernel_store::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Task("disk full".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn insert_namespace(
            &self,
            namespace: &Namespace,
        ) -> ownership_kernel_store::Result<InsertResult> {
            self.check()?;
            self.inner.insert_namespace(namespace).await
        }

        async fn get_namespace(
            &self,
            id: &ObjectId,
        ) -> ownership_kernel_store::Result<Option<Namespace>> {
            self.inner.get_namespace(id).await
        }

        async fn update_namespace(&self, namespace: &Namespace) -> ownership_kernel_store::Result<()> {
            self.check()?;
            self.inner.update_namespace(namespace).await
        }

        async fn list_namespaces(&self) -> ownership_kernel_store::Result<Vec<ObjectId>> {
            self.inner.list_namespaces().await
        }

        async fn namespace_for_package(
            &self,
            package: &PackageId,
        ) -> ownership_kernel_store::Result<Option<ObjectId>> {
            self.inner.namespace_for_package(package).await
        }

        async fn is_package_claimed(&self, package: &PackageId) -> ownership_kernel_store::Result<bool> {
            self.inner.is_package_claimed(package).await
        }

        async fn put_handoff(&self, handoff: &PackageHandoff) -> ownership_kernel_store::Result<()> {
            self.inner.put_handoff(handoff).await
        }

        async fn get_handoff(
            &self,
            id: &ObjectId,
        ) -> ownership_kernel_store::Result<Option<PackageHandoff>> {
            self.inner.get_handoff(id).await
        }

        async fn take_handoff(
            &self,
            id: &ObjectId,
        ) -> ownership_kernel_store::Result<Option<PackageHandoff>> {
            self.inner.take_handoff(id).await
        }
    }

    fn is_claimed(receipt: &PublishReceipt) -> bool {
        receipt
            .fields()
            .exists::<NamespaceClaim>(NAMESPACE_CLAIM_FIELD)
    }

    #[tokio::test]
    async fn test_claim_package_once() {
        let kernel = kernel();
        let mut receipt = PublishReceipt::new(package(0x50));
        let ns = kernel.claim_package(&mut receipt, id(1)).await.unwrap();

        assert_eq!(ns.principal(), package(0x50).identity());
        assert_eq!(kernel.namespace(&ns.id()).await.unwrap(), ns);

        // A second receipt for the same package is refused by the store check.
        let mut forged = PublishReceipt::new(package(0x50));
        let err = kernel.claim_package(&mut forged, id(2)).await.unwrap_err();
        assert!(matches!(err, KernelError::PackageAlreadyClaimed(p) if p == package(0x50)));
        assert_eq!(kernel.list_namespaces().await.unwrap(), vec![ns.id()]);
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_receipt() {
        let kernel = Kernel::new(FlakyStore::default(), KernelConfig::default());
        kernel.store().fail_writes.store(true, Ordering::SeqCst);

        let mut receipt = PublishReceipt::new(package(0x50));
        let err = kernel.claim_package(&mut receipt, id(1)).await.unwrap_err();
        assert!(matches!(err, KernelError::Store(StoreError::Task(_))));
        assert!(!is_claimed(&receipt));

        kernel.store().fail_writes.store(false, Ordering::SeqCst);
        let ns = kernel.claim_package(&mut receipt, id(1)).await.unwrap();
        assert!(is_claimed(&receipt));
        assert_eq!(kernel.list_namespaces().await.unwrap(), vec![ns.id()]);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_package_receipt() {
        let kernel = Kernel::new(FlakyStore::default(), KernelConfig::default());
        let ns = kernel
            .claim_package(&mut PublishReceipt::new(package(0x50)), id(1))
            .await
            .unwrap();
        let admin = kernel.login::<Admin>(&ns.id(), TxAuthority::begin(id(1))).await.unwrap();

        let mut receipt = PublishReceipt::new(package(0x60));
        kernel.store().fail_writes.store(true, Ordering::SeqCst);
        assert!(kernel
            .add_package_from_receipt(&ns.id(), &mut receipt, &admin)
            .await
            .is_err());
        assert!(!is_claimed(&receipt));

        kernel.store().fail_writes.store(false, Ordering::SeqCst);
        let ns = kernel
            .add_package_from_receipt(&ns.id(), &mut receipt, &admin)
            .await
            .unwrap();
        assert!(ns.contains_package(&package(0x60)));
        assert!(is_claimed(&receipt));
    }

    #[tokio::test]
    async fn test_admin_flow_persists() {
        let kernel = kernel();
        let mut receipt = PublishReceipt::new(package(0x50));
        let ns = kernel.claim_package(&mut receipt, id(1)).await.unwrap();

        let admin = kernel.login::<Admin>(&ns.id(), TxAuthority::begin(id(1))).await.unwrap();
        kernel
            .set_role_for_agent(&ns.id(), id(2), "editor", &admin)
            .await
            .unwrap();
        kernel
            .grant_permission_to_role::<Edit>(&ns.id(), "editor", &admin)
            .await
            .unwrap();

        let auth = kernel.login::<Edit>(&ns.id(), TxAuthority::begin(id(2))).await.unwrap();
        assert!(auth.has_permission::<Edit>(&ns.principal()));
        assert!(auth.has_package_permission::<Edit>(&package(0x50)));
    }

    #[tokio::test]
    async fn test_denied_update_persists_nothing() {
        let kernel = kernel();
        let mut receipt = PublishReceipt::new(package(0x50));
        let ns = kernel.claim_package(&mut receipt, id(1)).await.unwrap();

        let err = kernel
            .set_role_for_agent(&ns.id(), id(9), "editor", &TxAuthority::begin(id(9)))
            .await
            .unwrap_err();
        assert!(err.is_denied());
        assert_eq!(kernel.namespace(&ns.id()).await.unwrap(), ns);
    }

    #[tokio::test]
    async fn test_limits_checked_before_persist() {
        let config = KernelConfig {
            max_agents_per_namespace: 2,
            ..KernelConfig::default()
        };
        let kernel = Kernel::new(MemoryStore::new(), config);
        let mut receipt = PublishReceipt::new(package(0x50));
        let ns = kernel.claim_package(&mut receipt, id(1)).await.unwrap();
        let admin = kernel.login::<Admin>(&ns.id(), TxAuthority::begin(id(1))).await.unwrap();

        kernel.set_role_for_agent(&ns.id(), id(2), "a", &admin).await.unwrap();
        let err = kernel
            .set_role_for_agent(&ns.id(), id(3), "a", &admin)
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::LimitExceeded { kind: "agents", limit: 2, .. }));

        let stored = kernel.namespace(&ns.id()).await.unwrap();
        assert!(stored.rbac().agent_role(&id(3)).is_none());
    }

    #[tokio::test]
    async fn test_unknown_namespace() {
        let kernel = kernel();
        let missing = ObjectId::from_bytes([7; 32]);
        assert!(matches!(
            kernel.login::<Edit>(&missing, TxAuthority::begin(id(1))).await,
            Err(KernelError::NamespaceNotFound(n)) if n == missing
        ));
    }

    #[tokio::test]
    async fn test_issue_single_use() {
        let kernel = kernel();
        let mut receipt = PublishReceipt::new(package(0x50));
        let ns = kernel.claim_package(&mut receipt, id(1)).await.unwrap();
        let admin = kernel.login::<Admin>(&ns.id(), TxAuthority::begin(id(1))).await.unwrap();

        kernel.set_role_for_agent(&ns.id(), id(2), "issuer", &admin).await.unwrap();
        kernel
            .grant_permission_to_role::<SingleUse>(&ns.id(), "issuer", &admin)
            .await
            .unwrap();

        let issuer = kernel.claim(&ns.id(), &[id(2)], TxAuthority::begin(id(2))).await.unwrap();
        assert!(kernel.issue_single_use::<Edit>(&ns.id(), &issuer).await.is_err());

        kernel
            .grant_permission_to_role::<Edit>(&ns.id(), "issuer", &admin)
            .await
            .unwrap();
        let issuer = kernel.claim(&ns.id(), &[id(2)], TxAuthority::begin(id(2))).await.unwrap();
        let token = kernel.issue_single_use::<Edit>(&ns.id(), &issuer).await.unwrap();
        assert!(token.into_authority().has_permission::<Edit>(&ns.principal()));
    }
}
