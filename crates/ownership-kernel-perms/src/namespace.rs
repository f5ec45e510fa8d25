//! Namespaces: RBAC delegation for published packages.
//!
//! A namespace binds one [`Rbac`] to the identity of the package it was
//! created from. The principal is always that package identity, so nobody
//! can be tricked into creating a namespace controlled by someone else: the
//! `owner` argument only decides who becomes the first admin agent.
//!
//! Packages move between namespaces in two steps, each a separate atomic
//! call: the source namespace detaches the package into a
//! [`PackageHandoff`], and the holder of the handoff attaches it to the
//! destination namespace.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ownership_kernel_core::{Identity, ObjectId, PackageId, PublishReceipt, TypeIdentity};

use crate::authority::TxAuthority;
use crate::error::{PermsError, Result};
use crate::permission::{Admin, Manager, Permission};
use crate::rbac::Rbac;

/// Dynamic field name that marks a publish receipt as consumed.
pub const NAMESPACE_CLAIM_FIELD: &str = "namespace";

/// Attached to a publish receipt once its package joins a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceClaim {
    /// The namespace that consumed the receipt.
    pub namespace: ObjectId,
}

impl TypeIdentity for NamespaceClaim {
    const TYPE_NAME: &'static str = "0x1::namespace::NamespaceClaim";
}

/// A package detached from one namespace, waiting to join another.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHandoff {
    id: ObjectId,
    package: PackageId,
    from_namespace: ObjectId,
    holder: Identity,
}

impl PackageHandoff {
    /// The handoff object's id.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The package in transit.
    pub fn package(&self) -> PackageId {
        self.package
    }

    /// The namespace the package left.
    pub fn from_namespace(&self) -> ObjectId {
        self.from_namespace
    }

    /// Who may attach the package to a namespace.
    pub fn holder(&self) -> Identity {
        self.holder
    }
}

/// A receipt claim that has not been recorded on the receipt yet.
///
/// The receipt is only marked as consumed by [`ReceiptClaim::commit`].
/// Dropping the claim leaves the receipt usable, so a caller can persist
/// the namespace first and commit only once that succeeded.
#[must_use = "the receipt is not consumed until the claim is committed"]
#[derive(Debug)]
pub struct ReceiptClaim<'r> {
    receipt: &'r mut PublishReceipt,
    namespace: ObjectId,
}

impl ReceiptClaim<'_> {
    /// The package being claimed.
    pub fn package(&self) -> PackageId {
        self.receipt.package()
    }

    /// The namespace claiming the package.
    pub fn namespace(&self) -> ObjectId {
        self.namespace
    }

    /// Mark the receipt as consumed by the namespace.
    pub fn commit(self) -> Result<()> {
        self.receipt.attach(
            NAMESPACE_CLAIM_FIELD,
            &NamespaceClaim {
                namespace: self.namespace,
            },
        )?;
        Ok(())
    }
}

/// An RBAC bound to a set of packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    id: ObjectId,
    packages: BTreeSet<PackageId>,
    rbac: Rbac,
}

impl Namespace {
    /// Create a namespace from a package's publish receipt.
    ///
    /// The principal is the package identity. `owner` becomes the admin
    /// agent. The receipt is marked as consumed; presenting it again fails
    /// with [`PermsError::PackageAlreadyClaimed`].
    pub fn create_from_package(receipt: &mut PublishReceipt, owner: Identity) -> Result<Self> {
        let (namespace, claim) = Self::stage_from_package(receipt, owner)?;
        claim.commit()?;
        Ok(namespace)
    }

    /// Like [`Namespace::create_from_package`], but the receipt is only
    /// consumed once the returned claim is committed.
    pub fn stage_from_package(
        receipt: &mut PublishReceipt,
        owner: Identity,
    ) -> Result<(Self, ReceiptClaim<'_>)> {
        ensure_unclaimed(receipt)?;

        let id = ObjectId::random();
        let mut rbac = Rbac::new(receipt.package_identity());
        rbac.grant_admin_role_for_agent(owner);

        let namespace = Self {
            id,
            packages: BTreeSet::from([receipt.package()]),
            rbac,
        };
        Ok((
            namespace,
            ReceiptClaim {
                receipt,
                namespace: id,
            },
        ))
    }

    /// The namespace object's id.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The identity permissions are delegated for.
    pub fn principal(&self) -> Identity {
        self.rbac.principal()
    }

    /// Packages currently in this namespace.
    pub fn packages(&self) -> &BTreeSet<PackageId> {
        &self.packages
    }

    /// Whether `package` is in this namespace.
    pub fn contains_package(&self, package: &PackageId) -> bool {
        self.packages.contains(package)
    }

    /// Read access to the delegation tables.
    pub fn rbac(&self) -> &Rbac {
        &self.rbac
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Package Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Claim a freshly published package into this namespace.
    pub fn add_package_from_receipt(
        &mut self,
        receipt: &mut PublishReceipt,
        auth: &TxAuthority,
    ) -> Result<()> {
        self.stage_package_from_receipt(receipt, auth)?.commit()
    }

    /// Like [`Namespace::add_package_from_receipt`], but the receipt is only
    /// consumed once the returned claim is committed.
    pub fn stage_package_from_receipt<'r>(
        &mut self,
        receipt: &'r mut PublishReceipt,
        auth: &TxAuthority,
    ) -> Result<ReceiptClaim<'r>> {
        self.assert_admin(auth)?;
        ensure_unclaimed(receipt)?;
        self.packages.insert(receipt.package());
        Ok(ReceiptClaim {
            receipt,
            namespace: self.id,
        })
    }

    /// Detach `package`, handing it to `holder`.
    pub fn remove_package(
        &mut self,
        package: PackageId,
        holder: Identity,
        auth: &TxAuthority,
    ) -> Result<PackageHandoff> {
        self.assert_admin(auth)?;
        if !self.packages.remove(&package) {
            return Err(PermsError::PackageNotFound(package));
        }

        Ok(PackageHandoff {
            id: ObjectId::random(),
            package,
            from_namespace: self.id,
            holder,
        })
    }

    /// Attach a detached package, consuming the handoff.
    ///
    /// `auth` must be signed by the handoff's holder and carry admin
    /// standing for this namespace.
    pub fn add_package(&mut self, handoff: PackageHandoff, auth: &TxAuthority) -> Result<()> {
        if !auth.is_signed_by(&handoff.holder) {
            return Err(PermsError::PermissionDenied(format!(
                "handoff {} must be attached by {}",
                handoff.id, handoff.holder
            )));
        }
        self.assert_admin(auth)?;
        self.packages.insert(handoff.package);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // RBAC Administration
    // ─────────────────────────────────────────────────────────────────────────

    /// See [`Rbac::set_role_for_agent`].
    pub fn set_role_for_agent(
        &mut self,
        agent: Identity,
        role: impl Into<String>,
        auth: &TxAuthority,
    ) -> Result<()> {
        self.assert_admin(auth)?;
        self.rbac.set_role_for_agent(agent, role);
        Ok(())
    }

    /// See [`Rbac::grant_admin_role_for_agent`].
    pub fn grant_admin_role_for_agent(&mut self, agent: Identity, auth: &TxAuthority) -> Result<()> {
        self.assert_admin(auth)?;
        self.rbac.grant_admin_role_for_agent(agent);
        Ok(())
    }

    /// See [`Rbac::grant_manager_role_for_agent`].
    pub fn grant_manager_role_for_agent(
        &mut self,
        agent: Identity,
        auth: &TxAuthority,
    ) -> Result<()> {
        self.assert_admin(auth)?;
        self.rbac.grant_manager_role_for_agent(agent);
        Ok(())
    }

    /// See [`Rbac::delete_agent`].
    pub fn delete_agent(&mut self, agent: &Identity, auth: &TxAuthority) -> Result<()> {
        self.assert_admin(auth)?;
        self.rbac.delete_agent(agent);
        Ok(())
    }

    /// See [`Rbac::grant_permission_to_role`].
    pub fn grant_permission_to_role<P: Permission>(
        &mut self,
        role: impl Into<String>,
        auth: &TxAuthority,
    ) -> Result<()> {
        self.assert_admin(auth)?;
        self.rbac.grant_permission_to_role::<P>(role);
        Ok(())
    }

    /// See [`Rbac::revoke_permission_from_role`].
    pub fn revoke_permission_from_role<P: Permission>(
        &mut self,
        role: &str,
        auth: &TxAuthority,
    ) -> Result<()> {
        self.assert_admin(auth)?;
        self.rbac.revoke_permission_from_role::<P>(role);
        Ok(())
    }

    /// See [`Rbac::delete_role_and_agents`].
    pub fn delete_role_and_agents(&mut self, role: &str, auth: &TxAuthority) -> Result<()> {
        self.assert_admin(auth)?;
        self.rbac.delete_role_and_agents(role);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Login
    // ─────────────────────────────────────────────────────────────────────────

    /// Fold the delegated permissions of `candidates` into `auth`.
    ///
    /// Only candidates that are already full signers of `auth` are
    /// considered; candidates without a role contribute nothing. Grants are
    /// keyed by this namespace's principal. An admin role promotes the
    /// principal to a full signer, a manager role to the manager tier.
    /// Every package of the namespace is recorded as belonging to the
    /// principal.
    pub fn claim_permissions(&self, candidates: &[Identity], auth: TxAuthority) -> TxAuthority {
        let principal = self.principal();

        let signed: Vec<Identity> = candidates
            .iter()
            .filter(|agent| auth.is_signed_by(agent))
            .copied()
            .collect();

        let mut auth = auth;
        for agent in signed {
            let Ok(permissions) = self.rbac.get_agent_permissions(&agent) else {
                continue;
            };

            auth = if permissions.contains(&Admin::id()) {
                auth.add_full_signer(principal)
            } else if permissions.contains(&Manager::id()) {
                auth.add_manager(principal)
            } else {
                auth.extend_partial(principal, permissions.clone())
            };
        }

        for package in &self.packages {
            auth = auth.add_namespace_member(*package, principal);
        }
        auth
    }

    /// Claim with every full signer of `auth` and require `P` for the
    /// principal.
    pub fn assert_login<P: Permission>(&self, auth: TxAuthority) -> Result<TxAuthority> {
        let candidates: Vec<Identity> = auth.full_signers().copied().collect();
        let auth = self.claim_permissions(&candidates, auth);

        if !auth.has_permission::<P>(&self.principal()) {
            return Err(PermsError::PermissionDenied(format!(
                "{} lacks {} for {}",
                describe_signers(&candidates),
                P::TYPE_NAME,
                self.principal()
            )));
        }
        Ok(auth)
    }

    fn assert_admin(&self, auth: &TxAuthority) -> Result<()> {
        if auth.has_admin_permission(&self.principal()) {
            Ok(())
        } else {
            Err(PermsError::PermissionDenied(format!(
                "admin permission required for namespace {}",
                self.id
            )))
        }
    }
}

fn ensure_unclaimed(receipt: &PublishReceipt) -> Result<()> {
    if receipt
        .fields()
        .exists::<NamespaceClaim>(NAMESPACE_CLAIM_FIELD)
    {
        return Err(PermsError::PackageAlreadyClaimed(receipt.package()));
    }
    Ok(())
}

fn describe_signers(signers: &[Identity]) -> String {
    match signers {
        [] => "no signer".to_string(),
        [one] => one.to_string(),
        many => format!("{} signers", many.len()),
    }
}
