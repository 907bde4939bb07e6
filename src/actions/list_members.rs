use crate::config::PaginationConfig;
use crate::repository::MembershipRepository;
use crate::types::{ListQuery, MemberDetails, Membership};
use crate::AccessError;

/// Action to list the members of an organization.
///
/// Rows are joined with user and role, ordered by user display name, and
/// searchable by case-insensitive substring on name or email. The returned
/// total counts all matches regardless of the page window.
///
/// Callers must have verified the actor holds `MEMBER:READ` (via
/// [`AuthorizationGuard::require`]) before invoking this action.
///
/// [`AuthorizationGuard::require`]: crate::guard::AuthorizationGuard::require
pub struct ListMembersAction<M: MembershipRepository> {
    memberships: M,
    config: PaginationConfig,
}

impl<M: MembershipRepository> ListMembersAction<M> {
    /// Creates a new `ListMembersAction` with default pagination bounds.
    pub fn new(memberships: M) -> Self {
        Self {
            memberships,
            config: PaginationConfig::default(),
        }
    }

    /// Creates a new `ListMembersAction` with custom pagination bounds.
    pub fn with_config(memberships: M, config: PaginationConfig) -> Self {
        Self {
            memberships,
            config,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_members", skip_all, err)
    )]
    pub async fn execute(
        &self,
        actor: &Membership,
        org_id: i64,
        query: &ListQuery,
    ) -> Result<(Vec<MemberDetails>, u64), AccessError> {
        super::ensure_same_org(actor, org_id)?;

        let query = self.config.clamp(query);
        self.memberships.list(org_id, &query).await
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use super::*;
    use crate::mocks::{MockMembershipRepository, MockRoleRepository, MockUserRepository};
    use crate::repository::{CreateMembership, UserRepository};
    use crate::types::RoleAssignment;

    async fn seed() -> MockMembershipRepository {
        let users = MockUserRepository::new();
        let memberships =
            MockMembershipRepository::new(users.clone(), MockRoleRepository::new());

        for (email, name) in [
            ("carol@acme.com", "Carol"),
            ("alice@acme.com", "Alice"),
            ("bob@acme.com", "Bob"),
        ] {
            let user = users.upsert_by_email(email, name).await.unwrap();
            memberships
                .create(CreateMembership {
                    user_id: user.id,
                    org_id: 1,
                    role: RoleAssignment::Owner,
                })
                .await
                .unwrap();
        }

        memberships
    }

    #[tokio::test]
    async fn test_list_is_name_ordered() {
        let action = ListMembersAction::new(seed().await);
        let actor = Membership::mock_owner(1, 1);

        let (rows, total) = action
            .execute(&actor, 1, &ListQuery::page(1, 10))
            .await
            .unwrap();

        assert_eq!(total, 3);
        let names: Vec<&str> = rows.iter().map(|r| r.user.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
    }

    #[tokio::test]
    async fn test_rejects_mismatched_actor_org() {
        let action = ListMembersAction::new(seed().await);
        let actor = Membership::mock_owner(1, 1);

        let result = action.execute(&actor, 2, &ListQuery::page(1, 10)).await;
        assert_eq!(result.unwrap_err(), AccessError::Forbidden);
    }

    #[tokio::test]
    async fn test_pagination_window() {
        let action = ListMembersAction::new(seed().await);
        let actor = Membership::mock_owner(1, 1);

        let (rows, total) = action
            .execute(&actor, 1, &ListQuery::page(2, 2))
            .await
            .unwrap();

        assert_eq!(total, 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user.name, "Carol");
    }

    #[tokio::test]
    async fn test_unbounded_page_size_is_clamped() {
        let memberships = seed().await;
        let action = ListMembersAction::with_config(
            memberships,
            PaginationConfig {
                default_per_page: 2,
                max_per_page: 2,
            },
        );
        let actor = Membership::mock_owner(1, 1);

        let (rows, total) = action
            .execute(&actor, 1, &ListQuery::page(1, 1_000))
            .await
            .unwrap();

        assert_eq!(total, 3);
        assert_eq!(rows.len(), 2);
    }
}
