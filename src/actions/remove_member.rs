use crate::repository::MembershipRepository;
use crate::types::Membership;
use crate::AccessError;

/// Action to remove a member from an organization.
///
/// This action:
/// 1. Loads the target membership; when absent the removal is a no-op,
///    not an error
/// 2. Requires the actor to be an owner when the target is an owner
/// 3. Deletes the membership
///
/// Callers must have verified the actor holds `MEMBER:REMOVE` (via
/// [`AuthorizationGuard::require`]) before invoking this action.
///
/// [`AuthorizationGuard::require`]: crate::guard::AuthorizationGuard::require
pub struct RemoveMemberAction<M: MembershipRepository> {
    memberships: M,
}

impl<M: MembershipRepository> RemoveMemberAction<M> {
    /// Creates a new `RemoveMemberAction`.
    pub fn new(memberships: M) -> Self {
        Self { memberships }
    }

    /// Removes `target_user_id` from `org_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - The member was removed, or was not a member to begin
    ///   with
    /// - `Err(AccessError::Forbidden)` - The target is an owner and the
    ///   actor is not, or the actor membership is for a different org
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "remove_member", skip_all, err)
    )]
    pub async fn execute(
        &self,
        actor: &Membership,
        org_id: i64,
        target_user_id: i64,
    ) -> Result<(), AccessError> {
        super::ensure_same_org(actor, org_id)?;

        let Some(member) = self.memberships.find(target_user_id, org_id).await? else {
            // assume already removed
            return Ok(());
        };

        if member.role.is_owner() && !actor.role.is_owner() {
            return Err(AccessError::Forbidden);
        }

        self.memberships.delete(target_user_id, org_id).await?;

        log::info!(
            target: "orgward",
            "msg=\"member removed\", org_id={}, user_id={}",
            org_id,
            target_user_id
        );

        Ok(())
    }
}
