//! The authorization decision point.
//!
//! [`AuthorizationGuard`] answers one question: may this membership exercise
//! this permission? Owners always may. Custom roles resolve their permission
//! set through the [`RoleRepository`]; a role that is missing, or that
//! belongs to a different organization, leaves the member role-less and
//! every non-owner check denies.

use crate::permissions::{Permission, PermissionSet};
use crate::repository::RoleRepository;
use crate::types::Membership;
use crate::AccessError;

/// Decides allow/deny for a membership and a required permission.
///
/// The guard is the request layer's gate: handlers call [`require`] before
/// invoking a lifecycle action, the way a permission middleware would.
///
/// [`require`]: AuthorizationGuard::require
pub struct AuthorizationGuard<R: RoleRepository> {
    roles: R,
}

impl<R: RoleRepository> AuthorizationGuard<R> {
    /// Creates a guard resolving custom roles through `roles`.
    pub fn new(roles: R) -> Self {
        Self { roles }
    }

    /// Whether `actor` holds `permission` in its organization.
    ///
    /// Owners hold the entire catalog implicitly. Custom members hold
    /// exactly their role's set; a vanished or cross-org role resolves to
    /// the empty set.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "authorize", skip(self), err)
    )]
    pub async fn authorize(
        &self,
        actor: &Membership,
        permission: Permission,
    ) -> Result<bool, AccessError> {
        Ok(self
            .effective_permissions(actor)
            .await?
            .contains(permission))
    }

    /// Like [`authorize`](Self::authorize), but turns a deny into
    /// [`AccessError::Forbidden`].
    pub async fn require(
        &self,
        actor: &Membership,
        permission: Permission,
    ) -> Result<(), AccessError> {
        if self.authorize(actor, permission).await? {
            Ok(())
        } else {
            Err(AccessError::Forbidden)
        }
    }

    /// The full set of permissions `actor` currently holds.
    ///
    /// This is what a dashboard renders its controls from: the whole
    /// catalog for owners, the role's set for custom members, empty for
    /// role-less members.
    pub async fn effective_permissions(
        &self,
        actor: &Membership,
    ) -> Result<PermissionSet, AccessError> {
        let role_id = match actor.role.role_id() {
            // owners hold everything
            None => return Ok(PermissionSet::full()),
            Some(role_id) => role_id,
        };

        let role = self.roles.find_by_id(role_id).await?;

        Ok(match role {
            Some(role) if role.org_id == actor.org_id => role.permissions,
            // vanished or cross-org role: role-less member
            _ => PermissionSet::EMPTY,
        })
    }

    /// The escalation guard.
    ///
    /// Creating an owner membership, changing a role to or from owner, and
    /// removing an owner all require this to pass for the actor, in
    /// addition to whatever base permission the operation needs.
    #[must_use]
    pub fn can_act_on_owner_target(&self, actor: &Membership) -> bool {
        actor.role.is_owner()
    }
}
