//! Transaction authority sets.
//!
//! A [`TxAuthority`] collects everything vouching for the current call:
//! signers, object capabilities, module witnesses, and permissions claimed
//! from namespaces. Resource modules query it to authorize mutations.
//!
//! Authority sets are values. Every constructor and augmentation consumes
//! the input and returns a new set, and sets only ever grow: nothing
//! removes a signer or a grant once added.
//!
//! ## Tiers
//!
//! - **Full signers** have every permission for themselves.
//! - **Managers** have every permission except [`Admin`] for themselves.
//! - **Partial signers** have a specific set of ordinary permissions.
//!
//! Partial grants are keyed by the principal they are exercised on behalf
//! of (the namespace principal), not by the agent that claimed them.

use std::collections::{BTreeMap, BTreeSet};

use ownership_kernel_core::{Identity, ObjectId, PackageId};

use crate::error::Result;
use crate::permission::{self, Admin, Permission, PermissionId, PermissionSet};

/// The authority backing a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxAuthority {
    full_signers: BTreeSet<Identity>,
    managers: BTreeSet<Identity>,
    partial_signers: BTreeMap<Identity, PermissionSet>,
    namespaces: BTreeMap<PackageId, Identity>,
}

impl TxAuthority {
    /// An authority set vouching for nobody.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Open an authority set for a transaction signer.
    pub fn begin(signer: Identity) -> Self {
        Self::empty().add_full_signer(signer)
    }

    /// Open an authority set for the holder of a capability object.
    ///
    /// The caller must already hold the object; possession is not checked
    /// here.
    pub fn begin_with_object_capability(object: ObjectId) -> Self {
        Self::empty().add_object_capability(object)
    }

    /// Open an authority set for the module whose `Witness` struct is `W`.
    ///
    /// A module keeps its `Witness` constructor private, so holding one
    /// proves the call went through that module. Any type other than a
    /// module's `Witness` struct is refused.
    pub fn begin_with_type_witness<W>(witness: &W) -> Result<Self> {
        Self::empty().add_type_witness(witness)
    }

    /// Add an identity with unconditional standing.
    pub fn add_full_signer(mut self, identity: Identity) -> Self {
        self.full_signers.insert(identity);
        self
    }

    /// Add a capability object's identity as a full signer.
    pub fn add_object_capability(self, object: ObjectId) -> Self {
        self.add_full_signer(Identity::from(object))
    }

    /// Add the witness identity of `W`'s module as a full signer.
    ///
    /// Fails with [`CoreError::NotAWitness`](ownership_kernel_core::CoreError)
    /// unless `W` is a module's `Witness` struct.
    pub fn add_type_witness<W>(self, _witness: &W) -> Result<Self> {
        let identity = Identity::of_witness::<W>()?;
        Ok(self.add_full_signer(identity))
    }

    /// Grant `identity` a scoped set of ordinary permissions.
    ///
    /// Reserved permissions are rejected: admin standing is a full signer
    /// and manager standing is a separate tier.
    pub fn add_partial_signer<I>(self, identity: Identity, permissions: I) -> Result<Self>
    where
        I: IntoIterator<Item = PermissionId>,
    {
        let permissions: PermissionSet = permissions.into_iter().collect();
        permission::ensure_no_reserved(&permissions)?;
        Ok(self.extend_partial(identity, permissions))
    }

    /// Union an already-validated ordinary set into `identity`'s grants.
    pub(crate) fn extend_partial(mut self, identity: Identity, permissions: PermissionSet) -> Self {
        self.partial_signers
            .entry(identity)
            .or_default()
            .extend(permissions);
        self
    }

    /// Promote `identity` to the manager tier.
    pub(crate) fn add_manager(mut self, identity: Identity) -> Self {
        self.managers.insert(identity);
        self
    }

    /// Record that `package` belongs to the namespace of `principal`.
    ///
    /// The first recorded principal for a package wins.
    pub(crate) fn add_namespace_member(mut self, package: PackageId, principal: Identity) -> Self {
        self.namespaces.entry(package).or_insert(principal);
        self
    }

    /// Union of two authority sets.
    ///
    /// Signers, managers and partial grants are unioned. Namespace
    /// membership is not: when both sets record a package under different
    /// principals, as after the package moved between namespaces, `self`'s
    /// principal is kept and `other`'s is dropped.
    pub fn merge(mut self, other: TxAuthority) -> Self {
        self.full_signers.extend(other.full_signers);
        self.managers.extend(other.managers);
        for (identity, permissions) in other.partial_signers {
            self = self.extend_partial(identity, permissions);
        }
        for (package, principal) in other.namespaces {
            self = self.add_namespace_member(package, principal);
        }
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signer Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `identity` is a full signer.
    pub fn is_signed_by(&self, identity: &Identity) -> bool {
        self.full_signers.contains(identity)
    }

    /// Like [`TxAuthority::is_signed_by`], but `None` means "no constraint".
    pub fn is_signed_by_optional(&self, identity: Option<&Identity>) -> bool {
        identity.map_or(true, |id| self.is_signed_by(id))
    }

    /// Whether the holder of `object` vouches for this call.
    pub fn is_signed_by_object(&self, object: &ObjectId) -> bool {
        self.is_signed_by(&Identity::from(*object))
    }

    /// Whether the module that declares `T` vouches for this call.
    pub fn is_signed_by_module<T: ?Sized>(&self) -> Result<bool> {
        Ok(self.is_signed_by(&Identity::witness_of::<T>()?))
    }

    /// How many distinct `identities` are full signers.
    pub fn number_of_signers(&self, identities: &[Identity]) -> usize {
        identities
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|id| self.is_signed_by(id))
            .count()
    }

    /// Whether at least `k` distinct `identities` are full signers.
    pub fn has_k_of_n(&self, identities: &[Identity], k: usize) -> bool {
        self.number_of_signers(identities) >= k
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permission Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether this call may exercise `P` on behalf of `principal`.
    pub fn has_permission<P: Permission>(&self, principal: &Identity) -> bool {
        self.has_permission_id(principal, &P::id())
    }

    /// Like [`TxAuthority::has_permission`], ignoring the manager tier.
    pub fn has_permission_excluding_manager<P: Permission>(&self, principal: &Identity) -> bool {
        self.has_permission_id_excluding_manager(principal, &P::id())
    }

    /// Whether this call has admin standing for `principal`.
    pub fn has_admin_permission(&self, principal: &Identity) -> bool {
        self.has_permission::<Admin>(principal)
    }

    /// Runtime form of [`TxAuthority::has_permission`].
    pub fn has_permission_id(&self, principal: &Identity, permission: &PermissionId) -> bool {
        if self.is_signed_by(principal) {
            return true;
        }
        if !permission.is_admin() && self.managers.contains(principal) {
            return true;
        }
        self.partial_signers
            .get(principal)
            .is_some_and(|set| set.contains(permission))
    }

    /// Runtime form of [`TxAuthority::has_permission_excluding_manager`].
    pub fn has_permission_id_excluding_manager(
        &self,
        principal: &Identity,
        permission: &PermissionId,
    ) -> bool {
        self.is_signed_by(principal)
            || self
                .partial_signers
                .get(principal)
                .is_some_and(|set| set.contains(permission))
    }

    /// Whether this call may exercise `P` over `package`, through the
    /// principal of the namespace the package was claimed under.
    pub fn has_package_permission<P: Permission>(&self, package: &PackageId) -> bool {
        self.namespace_principal(package)
            .is_some_and(|principal| self.has_permission::<P>(&principal))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// The namespace principal recorded for `package`, if claimed.
    pub fn namespace_principal(&self, package: &PackageId) -> Option<Identity> {
        self.namespaces.get(package).copied()
    }

    /// All full signers.
    pub fn full_signers(&self) -> impl Iterator<Item = &Identity> {
        self.full_signers.iter()
    }

    /// Whether `principal` is in the manager tier.
    pub fn is_manager(&self, principal: &Identity) -> bool {
        self.managers.contains(principal)
    }

    /// The ordinary permissions granted for `principal`.
    pub fn partial_permissions(&self, principal: &Identity) -> Option<&PermissionSet> {
        self.partial_signers.get(principal)
    }

    /// Whether this set vouches for nobody.
    pub fn is_empty(&self) -> bool {
        self.full_signers.is_empty()
            && self.managers.is_empty()
            && self.partial_signers.is_empty()
            && self.namespaces.is_empty()
    }
}
