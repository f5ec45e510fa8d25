//! Single-use permission tokens.
//!
//! A token carries one ordinary permission for one principal and turns
//! into authority exactly once: redeeming it consumes it, and it cannot be
//! cloned. Issuing one needs both the permission being delegated and
//! [`SingleUse`], and the latter is not inherited from the manager tier, so
//! managers cannot mint bearer tokens on their own.

use ownership_kernel_core::Identity;

use crate::authority::TxAuthority;
use crate::error::{PermsError, Result};
use crate::permission::{Permission, PermissionId, PermissionSet, SingleUse};

/// A one-shot grant of a single permission.
#[derive(Debug, PartialEq, Eq)]
pub struct SingleUsePermission {
    principal: Identity,
    permission: PermissionId,
}

impl SingleUsePermission {
    /// Issue a token for `P` on behalf of `principal`.
    pub fn issue<P: Permission>(principal: Identity, auth: &TxAuthority) -> Result<Self> {
        Self::issue_id(principal, P::id(), auth)
    }

    /// Runtime form of [`SingleUsePermission::issue`].
    pub fn issue_id(
        principal: Identity,
        permission: PermissionId,
        auth: &TxAuthority,
    ) -> Result<Self> {
        if permission.is_reserved() {
            return Err(PermsError::ReservedPermissionInPartialGrant(permission));
        }
        if !auth.has_permission_excluding_manager::<SingleUse>(&principal) {
            return Err(PermsError::PermissionDenied(format!(
                "issuing single-use permissions for {principal} requires {}",
                SingleUse::id()
            )));
        }
        if !auth.has_permission_id(&principal, &permission) {
            return Err(PermsError::PermissionDenied(format!(
                "cannot delegate {permission} for {principal} without holding it"
            )));
        }

        Ok(Self {
            principal,
            permission,
        })
    }

    /// The principal the permission is exercised for.
    pub fn principal(&self) -> Identity {
        self.principal
    }

    /// The delegated permission.
    pub fn permission(&self) -> &PermissionId {
        &self.permission
    }

    /// Consume the token into a fresh authority set.
    pub fn into_authority(self) -> TxAuthority {
        self.redeem(TxAuthority::empty())
    }

    /// Consume the token, folding its grant into `auth`.
    pub fn redeem(self, auth: TxAuthority) -> TxAuthority {
        let permissions = PermissionSet::from([self.permission]);
        auth.extend_partial(self.principal, permissions)
    }
}

impl TxAuthority {
    /// Open an authority set from a single-use token.
    pub fn begin_with_single_use(token: SingleUsePermission) -> Self {
        token.into_authority()
    }
}
