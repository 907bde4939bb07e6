use crate::permissions::PermissionSet;
use crate::repository::{CreateRole, RoleRepository};
use crate::types::{Membership, Role};
use crate::AccessError;

/// Input data for creating a role.
///
/// Permissions arrive as string identifiers, the way a request payload
/// carries them; they are parsed against the catalog before anything is
/// persisted.
#[derive(Debug, Clone)]
pub struct CreateRoleInput {
    pub name: String,
    pub permissions: Vec<String>,
}

/// Action to create a role in an organization.
///
/// Role names are not unique within an org; two roles may share a name.
///
/// Callers must have verified the actor holds `ROLE:WRITE` (via
/// [`AuthorizationGuard::require`]) before invoking this action.
///
/// [`AuthorizationGuard::require`]: crate::guard::AuthorizationGuard::require
pub struct CreateRoleAction<R: RoleRepository> {
    roles: R,
}

impl<R: RoleRepository> CreateRoleAction<R> {
    /// Creates a new `CreateRoleAction`.
    pub fn new(roles: R) -> Self {
        Self { roles }
    }

    /// Creates a role named `input.name` with the given permission set.
    ///
    /// # Returns
    ///
    /// - `Ok(role)` - The created role
    /// - `Err(AccessError::Validation(_))` - Empty name, or a permission
    ///   identifier outside the catalog
    /// - `Err(AccessError::Forbidden)` - Actor membership for a different
    ///   org
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_role", skip_all, err)
    )]
    pub async fn execute(
        &self,
        actor: &Membership,
        org_id: i64,
        input: CreateRoleInput,
    ) -> Result<Role, AccessError> {
        super::ensure_same_org(actor, org_id)?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AccessError::Validation("role name must not be empty".into()));
        }

        let permissions = PermissionSet::from_names(&input.permissions)
            .map_err(|unknown| AccessError::Validation(format!("unknown permission: {unknown}")))?;

        let role = self
            .roles
            .create(CreateRole {
                org_id,
                name: name.to_owned(),
                permissions,
            })
            .await?;

        log::info!(
            target: "orgward",
            "msg=\"role created\", org_id={}, role_id={}, permissions={}",
            org_id,
            role.id,
            role.permissions.len()
        );

        Ok(role)
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use super::*;
    use crate::mocks::MockRoleRepository;
    use crate::permissions::Permission;

    fn input(name: &str, permissions: &[&str]) -> CreateRoleInput {
        CreateRoleInput {
            name: name.to_owned(),
            permissions: permissions.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_role() {
        let action = CreateRoleAction::new(MockRoleRepository::new());
        let actor = Membership::mock_owner(1, 1);

        let role = action
            .execute(&actor, 1, input("Support", &["MEMBER:READ", "MEMBER:ADD"]))
            .await
            .unwrap();

        assert_eq!(role.org_id, 1);
        assert_eq!(role.name, "Support");
        assert!(role.permissions.contains(Permission::MemberRead));
        assert!(role.permissions.contains(Permission::MemberAdd));
        assert!(!role.permissions.contains(Permission::RoleDelete));
    }

    #[tokio::test]
    async fn test_create_role_trims_name() {
        let action = CreateRoleAction::new(MockRoleRepository::new());
        let actor = Membership::mock_owner(1, 1);

        let role = action
            .execute(&actor, 1, input("  Support  ", &[]))
            .await
            .unwrap();
        assert_eq!(role.name, "Support");
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let action = CreateRoleAction::new(MockRoleRepository::new());
        let actor = Membership::mock_owner(1, 1);

        let result = action.execute(&actor, 1, input("   ", &[])).await;
        assert!(matches!(result, Err(AccessError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_permission_is_rejected_before_persistence() {
        let roles = MockRoleRepository::new();
        let action = CreateRoleAction::new(roles.clone());
        let actor = Membership::mock_owner(1, 1);

        let result = action
            .execute(&actor, 1, input("Support", &["MEMBER:READ", "BOGUS:PERM"]))
            .await;
        assert!(matches!(result, Err(AccessError::Validation(_))));

        // nothing persisted
        let (all, total) = roles
            .list(1, &crate::types::ListQuery::page(1, 10))
            .await
            .unwrap();
        assert!(all.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_allowed() {
        let action = CreateRoleAction::new(MockRoleRepository::new());
        let actor = Membership::mock_owner(1, 1);

        let first = action.execute(&actor, 1, input("Support", &[])).await.unwrap();
        let second = action.execute(&actor, 1, input("Support", &[])).await.unwrap();
        assert_ne!(first.id, second.id);
    }
}
