//! Core types for organization membership management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::permissions::PermissionSet;

/// A user of the dashboard.
///
/// Users are process-wide (not scoped to an organization) and may hold
/// memberships in several organizations at once. They are created lazily on
/// first invite or first authentication and never deleted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: i64,
    /// Unique email, stored lowercase.
    pub email: String,
    /// Display name.
    pub name: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// An organization: the tenant boundary.
///
/// All roles and memberships belong to exactly one organization. Org
/// lifecycle (creation, billing, deletion) lives outside this crate; the
/// record is carried because everything else references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Org {
    /// Unique identifier.
    pub id: i64,
    /// Unique domain the org is reached under.
    pub domain: String,
    /// Display name.
    pub name: String,
    /// When the org was created.
    pub created_at: DateTime<Utc>,
    /// When the org was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A named, organization-scoped bundle of permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier.
    pub id: i64,
    /// The organization this role belongs to.
    pub org_id: i64,
    /// Human-readable role name. Not unique within an org.
    pub name: String,
    /// The permissions this role grants.
    pub permissions: PermissionSet,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The role a membership carries: built-in owner, or a custom role.
///
/// Owners hold the full permission catalog implicitly and carry no role
/// reference, so "owner has no role id" is enforced by the type rather
/// than by a nullable column convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RoleAssignment {
    /// Full permissions; only another owner may grant or revoke this.
    Owner,
    /// Permissions come from the referenced role, which must belong to the
    /// same organization as the membership.
    Custom {
        /// The referenced role.
        role_id: i64,
    },
}

impl RoleAssignment {
    /// True for the built-in owner designation.
    #[must_use]
    pub fn is_owner(self) -> bool {
        matches!(self, Self::Owner)
    }

    /// The referenced role id, if this is a custom assignment.
    #[must_use]
    pub fn role_id(self) -> Option<i64> {
        match self {
            Self::Owner => None,
            Self::Custom { role_id } => Some(role_id),
        }
    }
}

/// Links a user to an organization with a role assignment.
///
/// Identity is the (`user_id`, `org_id`) pair; there is at most one
/// membership per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// The member.
    pub user_id: i64,
    /// The organization.
    pub org_id: i64,
    /// Owner designation or custom role reference.
    pub role: RoleAssignment,
    /// When the user joined the organization.
    pub created_at: DateTime<Utc>,
    /// When the membership was last updated.
    pub updated_at: DateTime<Utc>,
}

#[cfg(any(test, feature = "mocks"))]
impl Membership {
    pub fn mock_owner(user_id: i64, org_id: i64) -> Self {
        let now = Utc::now();
        Membership {
            user_id,
            org_id,
            role: RoleAssignment::Owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mock_custom(user_id: i64, org_id: i64, role_id: i64) -> Self {
        let now = Utc::now();
        Membership {
            user_id,
            org_id,
            role: RoleAssignment::Custom { role_id },
            created_at: now,
            updated_at: now,
        }
    }
}

/// A membership joined with its user and, for custom assignments, its role.
///
/// This is the projection the member list renders: one row per member with
/// name, email, and role. `role` is `None` for owners and for members whose
/// role has been deleted out from under them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDetails {
    pub membership: Membership,
    pub user: User,
    pub role: Option<Role>,
}

/// Pagination and search parameters for list operations.
///
/// `page` is 1-based. `search` filters by case-insensitive substring; which
/// fields it matches depends on the listing (role name, or member
/// name/email).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
}

impl ListQuery {
    /// A query for the first page with the given page size.
    #[must_use]
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            search: None,
        }
    }

    /// Same query with a search term.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Number of records to skip for this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// The search term, if it is non-empty after trimming.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_assignment_owner_has_no_role_id() {
        assert!(RoleAssignment::Owner.is_owner());
        assert_eq!(RoleAssignment::Owner.role_id(), None);
    }

    #[test]
    fn test_role_assignment_custom_carries_role_id() {
        let assignment = RoleAssignment::Custom { role_id: 42 };
        assert!(!assignment.is_owner());
        assert_eq!(assignment.role_id(), Some(42));
    }

    #[test]
    fn test_role_assignment_serde_tagging() {
        let owner = serde_json::to_string(&RoleAssignment::Owner).unwrap();
        assert_eq!(owner, r#"{"type":"owner"}"#);

        let custom = serde_json::to_string(&RoleAssignment::Custom { role_id: 7 }).unwrap();
        assert_eq!(custom, r#"{"type":"custom","role_id":7}"#);

        let parsed: RoleAssignment = serde_json::from_str(&custom).unwrap();
        assert_eq!(parsed, RoleAssignment::Custom { role_id: 7 });
    }

    #[test]
    fn test_list_query_offset() {
        assert_eq!(ListQuery::page(1, 20).offset(), 0);
        assert_eq!(ListQuery::page(3, 20).offset(), 40);
        // page 0 behaves like page 1
        assert_eq!(ListQuery::page(0, 20).offset(), 0);
    }

    #[test]
    fn test_list_query_search_term_trims() {
        let query = ListQuery::page(1, 20).with_search("  alice  ");
        assert_eq!(query.search_term(), Some("alice"));

        let blank = ListQuery::page(1, 20).with_search("   ");
        assert_eq!(blank.search_term(), None);

        assert_eq!(ListQuery::page(1, 20).search_term(), None);
    }
}
