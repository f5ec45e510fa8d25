//! Permission identities.
//!
//! A permission is a marker type; its identity is its canonical type name.
//! Two permissions are reserved and compared by identity:
//!
//! - [`Admin`] satisfies every permission check, including edits to the
//!   RBAC itself.
//! - [`Manager`] satisfies every check except [`Admin`].
//!
//! A permission set holding a reserved permission holds nothing else.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use ownership_kernel_core::{TypeIdentity, TypeName};

use crate::error::{PermsError, Result};

/// A permission marker type.
///
/// ```rust
/// use ownership_kernel_core::TypeIdentity;
/// use ownership_kernel_perms::Permission;
///
/// pub struct EditPost;
/// impl TypeIdentity for EditPost {
///     const TYPE_NAME: &'static str = "0xb10c::post::EDIT";
/// }
/// impl Permission for EditPost {}
/// ```
pub trait Permission: TypeIdentity {
    /// The runtime identity of this permission.
    fn id() -> PermissionId {
        PermissionId(Self::TYPE_NAME.to_string())
    }
}

/// Reserved: every permission.
pub struct Admin;

impl TypeIdentity for Admin {
    const TYPE_NAME: &'static str = "0x1::permissions::ADMIN";
}
impl Permission for Admin {}

/// Reserved: every permission except [`Admin`].
pub struct Manager;

impl TypeIdentity for Manager {
    const TYPE_NAME: &'static str = "0x1::permissions::MANAGER";
}
impl Permission for Manager {}

/// Allows issuing single-use permission tokens.
///
/// Never inherited through [`Manager`] when issuing.
pub struct SingleUse;

impl TypeIdentity for SingleUse {
    const TYPE_NAME: &'static str = "0x1::permissions::SINGLE_USE";
}
impl Permission for SingleUse {}

/// Runtime identity of a permission: its canonical type name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(String);

impl PermissionId {
    /// The identity of `P`.
    pub fn of<P: Permission>() -> Self {
        P::id()
    }

    /// Parse a permission identity from a canonical type name.
    pub fn parse(type_name: &str) -> Result<Self> {
        let parsed = TypeName::parse(type_name)?;
        Ok(Self(parsed.to_string()))
    }

    /// The canonical type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved [`Admin`] permission.
    pub fn is_admin(&self) -> bool {
        self.0 == Admin::TYPE_NAME
    }

    /// Whether this is the reserved [`Manager`] permission.
    pub fn is_manager(&self) -> bool {
        self.0 == Manager::TYPE_NAME
    }

    /// Whether this is [`Admin`] or [`Manager`].
    pub fn is_reserved(&self) -> bool {
        self.is_admin() || self.is_manager()
    }
}

impl fmt::Debug for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionId({})", self.0)
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of permissions held by a role or a partial signer.
pub type PermissionSet = BTreeSet<PermissionId>;

/// Whether `set` satisfies `permission`, honouring the reserved tiers.
pub fn has_permission(set: &PermissionSet, permission: &PermissionId) -> bool {
    if set.contains(&Admin::id()) {
        return true;
    }
    if !permission.is_admin() && set.contains(&Manager::id()) {
        return true;
    }
    set.contains(permission)
}

/// Like [`has_permission`] but a [`Manager`] grant does not count.
pub fn has_permission_excluding_manager(set: &PermissionSet, permission: &PermissionId) -> bool {
    set.contains(&Admin::id()) || set.contains(permission)
}

/// Whether `set` holds a reserved permission.
pub fn contains_reserved(set: &PermissionSet) -> bool {
    set.iter().any(PermissionId::is_reserved)
}

/// Reject sets that carry a reserved permission.
pub(crate) fn ensure_no_reserved(set: &PermissionSet) -> Result<()> {
    match set.iter().find(|p| p.is_reserved()) {
        Some(reserved) => Err(PermsError::ReservedPermissionInPartialGrant(reserved.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Edit;
    impl TypeIdentity for Edit {
        const TYPE_NAME: &'static str = "0xb10c::post::EDIT";
    }
    impl Permission for Edit {}

    struct Delete;
    impl TypeIdentity for Delete {
        const TYPE_NAME: &'static str = "0xb10c::post::DELETE";
    }
    impl Permission for Delete {}

    #[test]
    fn test_reserved_identities() {
        assert!(Admin::id().is_admin());
        assert!(Manager::id().is_manager());
        assert!(!SingleUse::id().is_reserved());
        assert!(!Edit::id().is_reserved());
        assert_ne!(Admin::id(), Manager::id());
    }

    #[test]
    fn test_parse_matches_marker() {
        assert_eq!(PermissionId::parse("0xb10c::post::EDIT").unwrap(), Edit::id());
        assert!(PermissionId::parse("EDIT").is_err());
    }

    #[test]
    fn test_ordinary_set() {
        let set: PermissionSet = [Edit::id()].into_iter().collect();
        assert!(has_permission(&set, &Edit::id()));
        assert!(!has_permission(&set, &Delete::id()));
        assert!(!has_permission(&set, &Admin::id()));
    }

    #[test]
    fn test_admin_set_grants_everything() {
        let set: PermissionSet = [Admin::id()].into_iter().collect();
        assert!(has_permission(&set, &Edit::id()));
        assert!(has_permission(&set, &Admin::id()));
        assert!(has_permission_excluding_manager(&set, &SingleUse::id()));
    }

    #[test]
    fn test_manager_set_grants_all_but_admin() {
        let set: PermissionSet = [Manager::id()].into_iter().collect();
        assert!(has_permission(&set, &Edit::id()));
        assert!(has_permission(&set, &Manager::id()));
        assert!(!has_permission(&set, &Admin::id()));
        assert!(!has_permission_excluding_manager(&set, &Edit::id()));
    }

    #[test]
    fn test_ensure_no_reserved() {
        let ordinary: PermissionSet = [Edit::id(), Delete::id()].into_iter().collect();
        assert!(ensure_no_reserved(&ordinary).is_ok());
        assert!(!contains_reserved(&ordinary));

        let mixed: PermissionSet = [Edit::id(), Manager::id()].into_iter().collect();
        assert!(contains_reserved(&mixed));
        assert!(matches!(
            ensure_no_reserved(&mixed),
            Err(PermsError::ReservedPermissionInPartialGrant(p)) if p.is_manager()
        ));
    }
}
