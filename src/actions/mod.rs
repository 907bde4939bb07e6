//! Lifecycle and store operations.
//!
//! Each action is a struct generic over the repository traits it touches,
//! with an async `execute`. Actions take the actor's [`Membership`] and the
//! target org id explicitly; there is no ambient request state.
//!
//! Base-permission checks (`MEMBER:ADD` and friends) are the calling
//! layer's job, done with [`AuthorizationGuard::require`] before an action
//! is invoked. The owner-escalation guard and role-ownership validation
//! live inside the actions, since they depend on the target record.
//!
//! [`Membership`]: crate::types::Membership
//! [`AuthorizationGuard::require`]: crate::guard::AuthorizationGuard::require

mod change_member_role;
mod create_role;
mod delete_role;
mod invite_member;
mod list_members;
mod list_roles;
mod remove_member;
mod update_role;

pub use change_member_role::ChangeMemberRoleAction;
pub use create_role::{CreateRoleAction, CreateRoleInput};
pub use delete_role::DeleteRoleAction;
pub use invite_member::{InviteMemberAction, InviteMemberInput};
pub use list_members::ListMembersAction;
pub use list_roles::ListRolesAction;
pub use remove_member::RemoveMemberAction;
pub use update_role::{UpdateRoleAction, UpdateRoleInput};

use crate::types::Membership;
use crate::AccessError;

/// The actor's membership must be for the org it is acting on. A mismatch
/// is a caller bug, but it is rejected as Forbidden rather than trusted —
/// it would otherwise punch through the tenant boundary.
fn ensure_same_org(actor: &Membership, org_id: i64) -> Result<(), AccessError> {
    if actor.org_id == org_id {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_same_org() {
        let actor = Membership::mock_owner(1, 1);
        assert!(ensure_same_org(&actor, 1).is_ok());
        assert_eq!(ensure_same_org(&actor, 2), Err(AccessError::Forbidden));
    }
}
