use crate::permissions::PermissionSet;
use crate::repository::{RoleRepository, UpdateRole};
use crate::types::{Membership, Role};
use crate::AccessError;

/// Input data for updating a role. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateRoleInput {
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// Action to update a role's name and/or permission set.
///
/// Callers must have verified the actor holds `ROLE:WRITE` (via
/// [`AuthorizationGuard::require`]) before invoking this action.
///
/// [`AuthorizationGuard::require`]: crate::guard::AuthorizationGuard::require
pub struct UpdateRoleAction<R: RoleRepository> {
    roles: R,
}

impl<R: RoleRepository> UpdateRoleAction<R> {
    /// Creates a new `UpdateRoleAction`.
    pub fn new(roles: R) -> Self {
        Self { roles }
    }

    /// Applies `input` to the role `role_id` of `org_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(role)` - The updated role
    /// - `Err(AccessError::NotFound)` - No such role in that org
    /// - `Err(AccessError::Validation(_))` - Empty name, or a permission
    ///   identifier outside the catalog
    /// - `Err(AccessError::Forbidden)` - Actor membership for a different
    ///   org
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "update_role", skip_all, err)
    )]
    pub async fn execute(
        &self,
        actor: &Membership,
        org_id: i64,
        role_id: i64,
        input: UpdateRoleInput,
    ) -> Result<Role, AccessError> {
        super::ensure_same_org(actor, org_id)?;

        let name = match input.name {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(AccessError::Validation("role name must not be empty".into()));
                }
                Some(trimmed.to_owned())
            }
            None => None,
        };

        let permissions = match input.permissions {
            Some(names) => Some(PermissionSet::from_names(&names).map_err(|unknown| {
                AccessError::Validation(format!("unknown permission: {unknown}"))
            })?),
            None => None,
        };

        let role = self
            .roles
            .update(role_id, org_id, UpdateRole { name, permissions })
            .await?;

        log::info!(
            target: "orgward",
            "msg=\"role updated\", org_id={}, role_id={}",
            org_id,
            role_id
        );

        Ok(role)
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use super::*;
    use crate::mocks::MockRoleRepository;
    use crate::permissions::Permission;
    use crate::repository::CreateRole;

    async fn seed(roles: &MockRoleRepository, org_id: i64) -> Role {
        roles
            .create(CreateRole {
                org_id,
                name: "Support".to_owned(),
                permissions: [Permission::MemberRead].into_iter().collect(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_name_keeps_permissions() {
        let roles = MockRoleRepository::new();
        let role = seed(&roles, 1).await;

        let action = UpdateRoleAction::new(roles);
        let actor = Membership::mock_owner(1, 1);

        let updated = action
            .execute(
                &actor,
                1,
                role.id,
                UpdateRoleInput {
                    name: Some("Tier 1".to_owned()),
                    permissions: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Tier 1");
        assert!(updated.permissions.contains(Permission::MemberRead));
    }

    #[tokio::test]
    async fn test_update_permissions_replaces_set() {
        let roles = MockRoleRepository::new();
        let role = seed(&roles, 1).await;

        let action = UpdateRoleAction::new(roles);
        let actor = Membership::mock_owner(1, 1);

        let updated = action
            .execute(
                &actor,
                1,
                role.id,
                UpdateRoleInput {
                    name: None,
                    permissions: Some(vec!["ROLE:READ".to_owned()]),
                },
            )
            .await
            .unwrap();

        assert!(updated.permissions.contains(Permission::RoleRead));
        assert!(!updated.permissions.contains(Permission::MemberRead));
    }

    #[tokio::test]
    async fn test_update_missing_role_is_not_found() {
        let action = UpdateRoleAction::new(MockRoleRepository::new());
        let actor = Membership::mock_owner(1, 1);

        let result = action
            .execute(&actor, 1, 42, UpdateRoleInput::default())
            .await;
        assert_eq!(result.unwrap_err(), AccessError::NotFound);
    }

    #[tokio::test]
    async fn test_update_cross_org_role_is_not_found() {
        let roles = MockRoleRepository::new();
        let foreign = seed(&roles, 2).await;

        let action = UpdateRoleAction::new(roles);
        let actor = Membership::mock_owner(1, 1);

        let result = action
            .execute(
                &actor,
                1,
                foreign.id,
                UpdateRoleInput {
                    name: Some("Hijacked".to_owned()),
                    permissions: None,
                },
            )
            .await;
        assert_eq!(result.unwrap_err(), AccessError::NotFound);
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_permission() {
        let roles = MockRoleRepository::new();
        let role = seed(&roles, 1).await;

        let action = UpdateRoleAction::new(roles);
        let actor = Membership::mock_owner(1, 1);

        let result = action
            .execute(
                &actor,
                1,
                role.id,
                UpdateRoleInput {
                    name: None,
                    permissions: Some(vec!["NOT:REAL".to_owned()]),
                },
            )
            .await;
        assert!(matches!(result, Err(AccessError::Validation(_))));
    }
}
