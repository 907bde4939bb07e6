use crate::repository::{CreateMembership, MembershipRepository, RoleRepository, UserRepository};
use crate::types::{Membership, RoleAssignment};
use crate::AccessError;

/// Input data for inviting a member.
#[derive(Debug, Clone)]
pub struct InviteMemberInput {
    /// Invitee email; matched case-insensitively against existing users.
    pub email: String,
    /// Display name for a newly created user. When unset, the email
    /// local-part is used.
    pub name: Option<String>,
    /// Owner designation or a custom role of the target org.
    pub role: RoleAssignment,
}

/// Action to invite a user into an organization.
///
/// This action:
/// 1. Normalizes and validates the invitee email
/// 2. Upserts the user by email (created lazily on first invite)
/// 3. Returns `Ok(None)` if the user is already a member — invites are
///    idempotent, not an error
/// 4. For an owner invite, requires the actor to be an owner
/// 5. For a custom role, verifies the role belongs to the target org
/// 6. Creates the membership
///
/// A [`AccessError::Conflict`] from the store means a concurrent invite won
/// the race; it converges to the same `Ok(None)` as an ordinary repeat
/// invite.
///
/// Callers must have verified the actor holds `MEMBER:ADD` (via
/// [`AuthorizationGuard::require`]) before invoking this action.
///
/// [`AuthorizationGuard::require`]: crate::guard::AuthorizationGuard::require
pub struct InviteMemberAction<U, M, R>
where
    U: UserRepository,
    M: MembershipRepository,
    R: RoleRepository,
{
    users: U,
    memberships: M,
    roles: R,
}

impl<U, M, R> InviteMemberAction<U, M, R>
where
    U: UserRepository,
    M: MembershipRepository,
    R: RoleRepository,
{
    /// Creates a new `InviteMemberAction`.
    pub fn new(users: U, memberships: M, roles: R) -> Self {
        Self {
            users,
            memberships,
            roles,
        }
    }

    /// Invites `input.email` into `org_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(membership))` - The user was added to the org
    /// - `Ok(None)` - Already a member; nothing changed
    /// - `Err(AccessError::Validation(_))` - Malformed email
    /// - `Err(AccessError::Forbidden)` - Owner invite by a non-owner, or
    ///   an actor membership for a different org
    /// - `Err(AccessError::NotFound)` - Custom role absent or in another org
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "invite_member", skip_all, err)
    )]
    pub async fn execute(
        &self,
        actor: &Membership,
        org_id: i64,
        input: InviteMemberInput,
    ) -> Result<Option<Membership>, AccessError> {
        super::ensure_same_org(actor, org_id)?;

        let (email, local_part) = normalize_email(&input.email)?;
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&local_part);

        let user = self.users.upsert_by_email(&email, name).await?;

        if self.memberships.find(user.id, org_id).await?.is_some() {
            // already a member, don't invite again
            return Ok(None);
        }

        match input.role {
            RoleAssignment::Owner => {
                if !actor.role.is_owner() {
                    return Err(AccessError::Forbidden);
                }
            }
            RoleAssignment::Custom { role_id } => {
                // a role from another org is indistinguishable from an
                // absent one
                match self.roles.find_by_id(role_id).await? {
                    Some(role) if role.org_id == org_id => {}
                    _ => return Err(AccessError::NotFound),
                }
            }
        }

        let membership = match self
            .memberships
            .create(CreateMembership {
                user_id: user.id,
                org_id,
                role: input.role,
            })
            .await
        {
            Ok(membership) => membership,
            // lost the existence-check/create race to a concurrent invite
            Err(AccessError::Conflict) => return Ok(None),
            Err(e) => return Err(e),
        };

        log::info!(
            target: "orgward",
            "msg=\"member invited\", org_id={}, user_id={}, owner={}",
            org_id,
            membership.user_id,
            membership.role.is_owner()
        );

        Ok(Some(membership))
    }
}

/// Lowercase the email and check its shape. Returns the normalized email
/// and its local part.
fn normalize_email(raw: &str) -> Result<(String, String), AccessError> {
    let email = raw.trim().to_lowercase();

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok((email.clone(), local.to_owned()))
        }
        _ => Err(AccessError::Validation("malformed email".to_owned())),
    }
}
