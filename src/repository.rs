//! Persistence traits consumed by the guard and lifecycle actions.
//!
//! Implementations must uphold the tenant boundary: every query that takes
//! an `org_id` is scoped to it, and a record that exists in a different org
//! is reported exactly like an absent one.

use async_trait::async_trait;

use crate::permissions::PermissionSet;
use crate::types::{ListQuery, MemberDetails, Membership, Org, Role, RoleAssignment, User};
use crate::AccessError;

/// Data for creating a role.
#[derive(Debug, Clone)]
pub struct CreateRole {
    pub org_id: i64,
    pub name: String,
    pub permissions: PermissionSet,
}

/// Partial update of a role. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub permissions: Option<PermissionSet>,
}

/// Data for creating a membership.
#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub user_id: i64,
    pub org_id: i64,
    pub role: RoleAssignment,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AccessError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccessError>;

    /// Find a user by email, creating one with the given name if absent.
    ///
    /// The email is expected to be lowercase already (callers normalize at
    /// the boundary). An existing user's name is not overwritten.
    async fn upsert_by_email(&self, email: &str, name: &str) -> Result<User, AccessError>;
}

#[async_trait]
pub trait OrgRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Org>, AccessError>;

    /// Lookup by domain, the way the request layer resolves its tenant.
    async fn find_by_domain(&self, domain: &str) -> Result<Option<Org>, AccessError>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn create(&self, data: CreateRole) -> Result<Role, AccessError>;

    /// Unscoped lookup. Callers comparing against a target org must treat a
    /// role from a different org as absent.
    async fn find_by_id(&self, role_id: i64) -> Result<Option<Role>, AccessError>;

    /// Roles of one org, name-filtered and paginated, ordered by name
    /// (id as tie-break). The returned total ignores the page window.
    async fn list(
        &self,
        org_id: i64,
        query: &ListQuery,
    ) -> Result<(Vec<Role>, u64), AccessError>;

    /// Fails with [`AccessError::NotFound`] when the role does not exist in
    /// that org.
    async fn update(
        &self,
        role_id: i64,
        org_id: i64,
        changes: UpdateRole,
    ) -> Result<Role, AccessError>;

    /// Fails with [`AccessError::NotFound`] when absent. Succeeds even while
    /// memberships still reference the role; those members become
    /// role-less.
    async fn delete(&self, role_id: i64, org_id: i64) -> Result<(), AccessError>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Fails with [`AccessError::Conflict`] when a membership for the
    /// (user, org) pair already exists. The unique constraint is the
    /// arbiter under concurrent creation.
    async fn create(&self, data: CreateMembership) -> Result<Membership, AccessError>;

    async fn find(&self, user_id: i64, org_id: i64) -> Result<Option<Membership>, AccessError>;

    /// Members of one org joined with user and role, ordered by user
    /// display name ascending (user id as tie-break), searchable by
    /// case-insensitive substring on name or email. The returned total
    /// ignores the page window.
    async fn list(
        &self,
        org_id: i64,
        query: &ListQuery,
    ) -> Result<(Vec<MemberDetails>, u64), AccessError>;

    /// Full replace of the role assignment. Fails with
    /// [`AccessError::NotFound`] when the membership is absent.
    async fn update_role(
        &self,
        user_id: i64,
        org_id: i64,
        role: RoleAssignment,
    ) -> Result<Membership, AccessError>;

    /// Deleting an absent membership is not an error.
    async fn delete(&self, user_id: i64, org_id: i64) -> Result<(), AccessError>;
}
