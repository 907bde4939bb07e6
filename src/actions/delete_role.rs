use crate::repository::RoleRepository;
use crate::types::Membership;
use crate::AccessError;

/// Action to delete a role.
///
/// Deletion is not blocked by memberships that still reference the role:
/// those members keep their custom assignment but become role-less, which
/// evaluates to the empty permission set until someone reassigns them.
///
/// Callers must have verified the actor holds `ROLE:DELETE` (via
/// [`AuthorizationGuard::require`]) before invoking this action.
///
/// [`AuthorizationGuard::require`]: crate::guard::AuthorizationGuard::require
pub struct DeleteRoleAction<R: RoleRepository> {
    roles: R,
}

impl<R: RoleRepository> DeleteRoleAction<R> {
    /// Creates a new `DeleteRoleAction`.
    pub fn new(roles: R) -> Self {
        Self { roles }
    }

    /// Deletes the role `role_id` of `org_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - The role was deleted
    /// - `Err(AccessError::NotFound)` - No such role in that org
    /// - `Err(AccessError::Forbidden)` - Actor membership for a different
    ///   org
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "delete_role", skip_all, err)
    )]
    pub async fn execute(
        &self,
        actor: &Membership,
        org_id: i64,
        role_id: i64,
    ) -> Result<(), AccessError> {
        super::ensure_same_org(actor, org_id)?;

        self.roles.delete(role_id, org_id).await?;

        log::info!(
            target: "orgward",
            "msg=\"role deleted\", org_id={}, role_id={}",
            org_id,
            role_id
        );

        Ok(())
    }
}
