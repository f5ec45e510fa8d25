//! Proptest generators for property-based testing.

use proptest::prelude::*;

use ownership_kernel_core::{Identity, Keypair, ObjectId, PackageId};
use ownership_kernel_perms::{Admin, Manager, Permission, PermissionId, Rbac, SingleUse};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Identity.
pub fn identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 32]>().prop_map(Identity::from_bytes)
}

/// Generate an identity from a small pool, so collisions happen.
pub fn small_identity() -> impl Strategy<Value = Identity> {
    (0u8..8).prop_map(|n| Identity::from_bytes([n; 32]))
}

/// Generate a random ObjectId.
pub fn object_id() -> impl Strategy<Value = ObjectId> {
    any::<[u8; 32]>().prop_map(ObjectId::from_bytes)
}

/// Generate a random PackageId.
pub fn package_id() -> impl Strategy<Value = PackageId> {
    any::<[u8; 32]>().prop_map(PackageId::from_bytes)
}

/// Generate a well-formed canonical type name.
pub fn type_name() -> impl Strategy<Value = String> {
    ("0x[0-9a-f]{1,8}", "[a-z][a-z0-9_]{0,11}", "[A-Za-z][A-Za-z0-9_]{0,15}")
        .prop_map(|(package, module, name)| format!("{package}::{module}::{name}"))
}

/// Generate an ordinary (non-reserved) permission id.
pub fn ordinary_permission() -> impl Strategy<Value = PermissionId> {
    prop_oneof![
        Just(SingleUse::id()),
        "[A-Z][A-Z_]{0,7}".prop_map(|name| {
            PermissionId::parse(&format!("0xb10c::post::{name}"))
                .unwrap_or_else(|e| panic!("generated permission: {e}"))
        }),
    ]
}

/// Generate any permission id, reserved ones included.
pub fn permission() -> impl Strategy<Value = PermissionId> {
    prop_oneof![
        1 => Just(Admin::id()),
        1 => Just(Manager::id()),
        6 => ordinary_permission(),
    ]
}

/// Generate a role name.
pub fn role_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("ADMIN".to_string()),
        Just("MANAGER".to_string()),
        "[a-z]{1,6}",
    ]
}

/// One mutation of an [`Rbac`].
#[derive(Debug, Clone)]
pub enum RbacOp {
    SetRole(Identity, String),
    GrantAdmin(Identity),
    GrantManager(Identity),
    DeleteAgent(Identity),
    Grant(String, PermissionId),
    Revoke(String, PermissionId),
    DeleteRole(String),
}

impl Arbitrary for RbacOp {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            (small_identity(), role_name()).prop_map(|(a, r)| RbacOp::SetRole(a, r)),
            small_identity().prop_map(RbacOp::GrantAdmin),
            small_identity().prop_map(RbacOp::GrantManager),
            small_identity().prop_map(RbacOp::DeleteAgent),
            (role_name(), permission()).prop_map(|(r, p)| RbacOp::Grant(r, p)),
            (role_name(), permission()).prop_map(|(r, p)| RbacOp::Revoke(r, p)),
            role_name().prop_map(RbacOp::DeleteRole),
        ]
        .boxed()
    }
}

/// Apply `op` to `rbac`.
pub fn apply_rbac_op(rbac: &mut Rbac, op: &RbacOp) {
    match op {
        RbacOp::SetRole(agent, role) => rbac.set_role_for_agent(*agent, role.clone()),
        RbacOp::GrantAdmin(agent) => rbac.grant_admin_role_for_agent(*agent),
        RbacOp::GrantManager(agent) => rbac.grant_manager_role_for_agent(*agent),
        RbacOp::DeleteAgent(agent) => rbac.delete_agent(agent),
        RbacOp::Grant(role, permission) => {
            rbac.grant_permission_id_to_role(role.clone(), permission.clone())
        }
        RbacOp::Revoke(role, permission) => rbac.revoke_permission_id_from_role(role, permission),
        RbacOp::DeleteRole(role) => rbac.delete_role_and_agents(role),
    }
}
