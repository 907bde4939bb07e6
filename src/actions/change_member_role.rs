use crate::repository::{MembershipRepository, RoleRepository};
use crate::types::{Membership, RoleAssignment};
use crate::AccessError;

/// Action to change an existing member's role.
///
/// This action:
/// 1. Loads the target membership (`NotFound` when absent)
/// 2. Requires the actor to be an owner when the transition touches owner
///    status in either direction — promoting to owner or demoting an owner
/// 3. For a custom role, verifies the role belongs to the target org
/// 4. Replaces the role assignment
///
/// Callers must have verified the actor holds `MEMBER:CHANGE-ROLE` (via
/// [`AuthorizationGuard::require`]) before invoking this action.
///
/// [`AuthorizationGuard::require`]: crate::guard::AuthorizationGuard::require
pub struct ChangeMemberRoleAction<M, R>
where
    M: MembershipRepository,
    R: RoleRepository,
{
    memberships: M,
    roles: R,
}

impl<M, R> ChangeMemberRoleAction<M, R>
where
    M: MembershipRepository,
    R: RoleRepository,
{
    /// Creates a new `ChangeMemberRoleAction`.
    pub fn new(memberships: M, roles: R) -> Self {
        Self { memberships, roles }
    }

    /// Assigns `new_role` to `target_user_id`'s membership in `org_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(membership)` - The updated membership
    /// - `Err(AccessError::NotFound)` - No such member, or custom role
    ///   absent or in another org
    /// - `Err(AccessError::Forbidden)` - Owner transition attempted by a
    ///   non-owner, or an actor membership for a different org
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "change_member_role", skip_all, err)
    )]
    pub async fn execute(
        &self,
        actor: &Membership,
        org_id: i64,
        target_user_id: i64,
        new_role: RoleAssignment,
    ) -> Result<Membership, AccessError> {
        super::ensure_same_org(actor, org_id)?;

        let member = self
            .memberships
            .find(target_user_id, org_id)
            .await?
            .ok_or(AccessError::NotFound)?;

        // owner transitions in either direction are owner-only
        if (new_role.is_owner() || member.role.is_owner()) && !actor.role.is_owner() {
            return Err(AccessError::Forbidden);
        }

        if let RoleAssignment::Custom { role_id } = new_role {
            match self.roles.find_by_id(role_id).await? {
                Some(role) if role.org_id == org_id => {}
                _ => return Err(AccessError::NotFound),
            }
        }

        let updated = self
            .memberships
            .update_role(target_user_id, org_id, new_role)
            .await?;

        log::info!(
            target: "orgward",
            "msg=\"member role changed\", org_id={}, user_id={}, owner={}",
            org_id,
            target_user_id,
            updated.role.is_owner()
        );

        Ok(updated)
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use super::*;
    use crate::mocks::{MockMembershipRepository, MockRoleRepository, MockUserRepository};
    use crate::permissions::Permission;
    use crate::repository::{CreateMembership, CreateRole};

    async fn setup() -> (MockMembershipRepository, MockRoleRepository) {
        let users = MockUserRepository::new();
        let roles = MockRoleRepository::new();
        let memberships = MockMembershipRepository::new(users, roles.clone());
        (memberships, roles)
    }

    async fn seed_member(
        memberships: &MockMembershipRepository,
        user_id: i64,
        org_id: i64,
        role: RoleAssignment,
    ) {
        memberships
            .create(CreateMembership {
                user_id,
                org_id,
                role,
            })
            .await
            .unwrap();
    }

    async fn seed_role(roles: &MockRoleRepository, org_id: i64) -> i64 {
        roles
            .create(CreateRole {
                org_id,
                name: "Support".to_owned(),
                permissions: [Permission::MemberRead].into_iter().collect(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_owner_promotes_member() {
        let (memberships, roles) = setup().await;
        let role_id = seed_role(&roles, 1).await;
        seed_member(&memberships, 2, 1, RoleAssignment::Custom { role_id }).await;

        let action = ChangeMemberRoleAction::new(memberships, roles);
        let actor = Membership::mock_owner(1, 1);

        let updated = action
            .execute(&actor, 1, 2, RoleAssignment::Owner)
            .await
            .unwrap();
        assert_eq!(updated.role, RoleAssignment::Owner);
    }

    #[tokio::test]
    async fn test_non_owner_cannot_promote() {
        let (memberships, roles) = setup().await;
        let role_id = seed_role(&roles, 1).await;
        seed_member(&memberships, 2, 1, RoleAssignment::Custom { role_id }).await;

        let action = ChangeMemberRoleAction::new(memberships.clone(), roles);
        let actor = Membership::mock_custom(9, 1, role_id);

        let result = action.execute(&actor, 1, 2, RoleAssignment::Owner).await;
        assert_eq!(result.unwrap_err(), AccessError::Forbidden);

        // unchanged
        let member = memberships.find(2, 1).await.unwrap().unwrap();
        assert_eq!(member.role, RoleAssignment::Custom { role_id });
    }

    #[tokio::test]
    async fn test_non_owner_cannot_demote_owner() {
        let (memberships, roles) = setup().await;
        let role_id = seed_role(&roles, 1).await;
        seed_member(&memberships, 2, 1, RoleAssignment::Owner).await;

        let action = ChangeMemberRoleAction::new(memberships.clone(), roles);
        let actor = Membership::mock_custom(9, 1, role_id);

        let result = action
            .execute(&actor, 1, 2, RoleAssignment::Custom { role_id })
            .await;
        assert_eq!(result.unwrap_err(), AccessError::Forbidden);

        let member = memberships.find(2, 1).await.unwrap().unwrap();
        assert!(member.role.is_owner());
    }

    #[tokio::test]
    async fn test_owner_demotes_owner() {
        let (memberships, roles) = setup().await;
        let role_id = seed_role(&roles, 1).await;
        seed_member(&memberships, 2, 1, RoleAssignment::Owner).await;

        let action = ChangeMemberRoleAction::new(memberships, roles);
        let actor = Membership::mock_owner(1, 1);

        let updated = action
            .execute(&actor, 1, 2, RoleAssignment::Custom { role_id })
            .await
            .unwrap();
        assert_eq!(updated.role, RoleAssignment::Custom { role_id });
    }

    #[tokio::test]
    async fn test_missing_member_is_not_found() {
        let (memberships, roles) = setup().await;
        let action = ChangeMemberRoleAction::new(memberships, roles);
        let actor = Membership::mock_owner(1, 1);

        let result = action.execute(&actor, 1, 42, RoleAssignment::Owner).await;
        assert_eq!(result.unwrap_err(), AccessError::NotFound);
    }

    #[tokio::test]
    async fn test_cross_org_role_is_not_found() {
        let (memberships, roles) = setup().await;
        seed_member(&memberships, 2, 1, RoleAssignment::Owner).await;
        let foreign_role = seed_role(&roles, 2).await;

        let action = ChangeMemberRoleAction::new(memberships, roles);
        let actor = Membership::mock_owner(1, 1);

        let result = action
            .execute(
                &actor,
                1,
                2,
                RoleAssignment::Custom {
                    role_id: foreign_role,
                },
            )
            .await;
        assert_eq!(result.unwrap_err(), AccessError::NotFound);
    }

    #[tokio::test]
    async fn test_role_less_member_can_be_reassigned() {
        let (memberships, roles) = setup().await;
        let role_id = seed_role(&roles, 1).await;
        // membership referencing a role that has since vanished
        seed_member(&memberships, 2, 1, RoleAssignment::Custom { role_id: 999 }).await;

        let action = ChangeMemberRoleAction::new(memberships, roles);
        let actor = Membership::mock_owner(1, 1);

        let updated = action
            .execute(&actor, 1, 2, RoleAssignment::Custom { role_id })
            .await
            .unwrap();
        assert_eq!(updated.role, RoleAssignment::Custom { role_id });
    }

    #[tokio::test]
    async fn test_rejects_mismatched_actor_org() {
        let (memberships, roles) = setup().await;
        seed_member(&memberships, 2, 1, RoleAssignment::Owner).await;

        let action = ChangeMemberRoleAction::new(memberships, roles);
        let actor = Membership::mock_owner(1, 2);

        let result = action.execute(&actor, 1, 2, RoleAssignment::Owner).await;
        assert_eq!(result.unwrap_err(), AccessError::Forbidden);
    }

    #[tokio::test]
    async fn test_ignores_last_owner_count() {
        // demoting the only owner is allowed when the actor is that owner;
        // protecting the last owner is the caller's product decision
        let (memberships, roles) = setup().await;
        let role_id = seed_role(&roles, 1).await;
        seed_member(&memberships, 1, 1, RoleAssignment::Owner).await;

        let actor = memberships.find(1, 1).await.unwrap().unwrap();
        let action = ChangeMemberRoleAction::new(memberships, roles);

        let updated = action
            .execute(&actor, 1, 1, RoleAssignment::Custom { role_id })
            .await
            .unwrap();
        assert_eq!(updated.role, RoleAssignment::Custom { role_id });
    }
}
