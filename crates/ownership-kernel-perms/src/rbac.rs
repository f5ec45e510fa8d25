//! Role-based delegation state.
//!
//! An [`Rbac`] belongs to exactly one principal for its whole lifetime. The
//! principal delegates by assigning each agent a single role and attaching
//! permissions to roles. Changing who controls an RBAC means moving the
//! object that holds it, never editing the principal.
//!
//! Invariants:
//! - every role referenced by an agent has an entry in `role_permissions`;
//! - a role's set is `{Admin}`, `{Manager}`, or only ordinary permissions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ownership_kernel_core::Identity;

use crate::error::{PermsError, Result};
use crate::permission::{self, Admin, Manager, Permission, PermissionId, PermissionSet};

/// Role name used by [`Rbac::grant_admin_role_for_agent`].
pub const ADMIN_ROLE: &str = "ADMIN";

/// Role name used by [`Rbac::grant_manager_role_for_agent`].
pub const MANAGER_ROLE: &str = "MANAGER";

/// Per-principal agent→role and role→permissions tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rbac {
    principal: Identity,
    agent_role: BTreeMap<Identity, String>,
    role_permissions: BTreeMap<String, PermissionSet>,
}

impl Rbac {
    /// Create an empty RBAC for `principal`.
    pub fn new(principal: Identity) -> Self {
        Self {
            principal,
            agent_role: BTreeMap::new(),
            role_permissions: BTreeMap::new(),
        }
    }

    /// The principal this RBAC delegates for.
    pub fn principal(&self) -> Identity {
        self.principal
    }

    /// Assign `role` to `agent`, replacing any previous role.
    pub fn set_role_for_agent(&mut self, agent: Identity, role: impl Into<String>) {
        let role = role.into();
        self.role_permissions.entry(role.clone()).or_default();
        self.agent_role.insert(agent, role);
    }

    /// Put `agent` in the reserved admin role.
    pub fn grant_admin_role_for_agent(&mut self, agent: Identity) {
        self.set_role_for_agent(agent, ADMIN_ROLE);
        self.grant_permission_to_role::<Admin>(ADMIN_ROLE);
    }

    /// Put `agent` in the reserved manager role.
    pub fn grant_manager_role_for_agent(&mut self, agent: Identity) {
        self.set_role_for_agent(agent, MANAGER_ROLE);
        self.grant_permission_to_role::<Manager>(MANAGER_ROLE);
    }

    /// Remove `agent`. No-op when absent.
    pub fn delete_agent(&mut self, agent: &Identity) {
        self.agent_role.remove(agent);
    }

    /// Grant `P` to `role`. See [`Rbac::grant_permission_id_to_role`].
    pub fn grant_permission_to_role<P: Permission>(&mut self, role: impl Into<String>) {
        self.grant_permission_id_to_role(role, P::id());
    }

    /// Grant `permission` to `role`, creating the role if needed.
    ///
    /// A reserved permission replaces the role's whole set. An ordinary
    /// permission is added, unless the role already holds a reserved
    /// permission, in which case the set is left as it is.
    pub fn grant_permission_id_to_role(&mut self, role: impl Into<String>, permission: PermissionId) {
        let set = self.role_permissions.entry(role.into()).or_default();

        if permission.is_reserved() {
            set.clear();
            set.insert(permission);
        } else if !permission::contains_reserved(set) {
            set.insert(permission);
        }
    }

    /// Revoke `P` from `role`. No-op when absent.
    pub fn revoke_permission_from_role<P: Permission>(&mut self, role: &str) {
        self.revoke_permission_id_from_role(role, &P::id());
    }

    /// Revoke `permission` from `role`. No-op when absent.
    pub fn revoke_permission_id_from_role(&mut self, role: &str, permission: &PermissionId) {
        if let Some(set) = self.role_permissions.get_mut(role) {
            set.remove(permission);
        }
    }

    /// Delete `role` and every agent assigned to it.
    pub fn delete_role_and_agents(&mut self, role: &str) {
        self.role_permissions.remove(role);
        self.agent_role.retain(|_, r| r != role);
    }

    /// The permissions `agent` holds through its role.
    pub fn get_agent_permissions(&self, agent: &Identity) -> Result<&PermissionSet> {
        let role = self
            .agent_role
            .get(agent)
            .ok_or(PermsError::UnknownAgent(*agent))?;

        // Roles referenced by agents always have an entry.
        self.role_permissions
            .get(role)
            .ok_or(PermsError::UnknownAgent(*agent))
    }

    /// The role assigned to `agent`, if any.
    pub fn agent_role(&self, agent: &Identity) -> Option<&str> {
        self.agent_role.get(agent).map(String::as_str)
    }

    /// The permissions attached to `role`, if it exists.
    pub fn role_permissions(&self, role: &str) -> Option<&PermissionSet> {
        self.role_permissions.get(role)
    }

    /// All agents and their roles.
    pub fn agents(&self) -> impl Iterator<Item = (&Identity, &str)> {
        self.agent_role.iter().map(|(a, r)| (a, r.as_str()))
    }

    /// All role names.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.role_permissions.keys().map(String::as_str)
    }

    /// Number of agents with a role.
    pub fn agent_count(&self) -> usize {
        self.agent_role.len()
    }

    /// Number of roles.
    pub fn role_count(&self) -> usize {
        self.role_permissions.len()
    }
}
