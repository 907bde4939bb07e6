use crate::config::PaginationConfig;
use crate::repository::RoleRepository;
use crate::types::{ListQuery, Membership, Role};
use crate::AccessError;

/// Action to list the roles of an organization.
///
/// Ordered by role name, searchable by case-insensitive substring on the
/// name. The returned total counts all matches regardless of the page
/// window.
///
/// Callers must have verified the actor holds `ROLE:READ` (via
/// [`AuthorizationGuard::require`]) before invoking this action.
///
/// [`AuthorizationGuard::require`]: crate::guard::AuthorizationGuard::require
pub struct ListRolesAction<R: RoleRepository> {
    roles: R,
    config: PaginationConfig,
}

impl<R: RoleRepository> ListRolesAction<R> {
    /// Creates a new `ListRolesAction` with default pagination bounds.
    pub fn new(roles: R) -> Self {
        Self {
            roles,
            config: PaginationConfig::default(),
        }
    }

    /// Creates a new `ListRolesAction` with custom pagination bounds.
    pub fn with_config(roles: R, config: PaginationConfig) -> Self {
        Self { roles, config }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_roles", skip_all, err)
    )]
    pub async fn execute(
        &self,
        actor: &Membership,
        org_id: i64,
        query: &ListQuery,
    ) -> Result<(Vec<Role>, u64), AccessError> {
        super::ensure_same_org(actor, org_id)?;

        let query = self.config.clamp(query);
        self.roles.list(org_id, &query).await
    }
}
