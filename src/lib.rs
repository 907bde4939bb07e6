//! Organization-scoped authorization core for multi-tenant dashboards.
//!
//! orgward models users, organizations, memberships, roles, and permissions,
//! and decides whether an actor may invoke an operation against an
//! organization's data. It enforces tenant isolation, a privileged owner
//! designation that only other owners may grant or revoke, and fine-grained
//! permission sets attached to custom roles.
//!
//! The crate is storage-agnostic: persistence is consumed through the
//! repository traits in [`repository`], with in-memory implementations
//! behind the `mocks` feature and PostgreSQL implementations behind the
//! `postgres` feature. Transport, sessions, and UI live in the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use orgward::{AuthorizationGuard, Permission};
//!
//! let guard = AuthorizationGuard::new(role_repo);
//!
//! // gate the request before invoking a lifecycle action
//! guard.require(&actor_membership, Permission::MemberAdd).await?;
//!
//! let outcome = invite_action.execute(&actor_membership, org_id, input).await?;
//! ```

pub mod actions;
pub mod config;
pub mod guard;
pub mod permissions;
pub mod repository;
pub mod types;

#[cfg(feature = "mocks")]
mod mocks;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use guard::AuthorizationGuard;
pub use permissions::{Permission, PermissionSet};
pub use repository::{
    CreateMembership, CreateRole, MembershipRepository, OrgRepository, RoleRepository,
    UpdateRole, UserRepository,
};
pub use types::{ListQuery, MemberDetails, Membership, Org, Role, RoleAssignment, User};

#[cfg(feature = "mocks")]
pub use mocks::{
    MockMembershipRepository, MockOrgRepository, MockRoleRepository, MockUserRepository,
};

use std::fmt;

/// Errors surfaced by guards, stores, and lifecycle actions.
///
/// Cross-organization references report [`AccessError::NotFound`] exactly
/// like absent records, so callers cannot probe for records in other
/// tenants. A missing base permission and a failed owner-escalation check
/// both surface as [`AccessError::Forbidden`].
#[derive(Debug, Clone, PartialEq)]
pub enum AccessError {
    /// Referenced role or membership does not exist in the target org.
    NotFound,
    /// The actor may not perform this operation.
    Forbidden,
    /// Unique-constraint race on membership creation.
    Conflict,
    /// Malformed input rejected before persistence.
    Validation(String),
    /// The backing store failed.
    DatabaseError(String),
    /// Invariant violation inside the library.
    Internal(String),
}

impl std::error::Error for AccessError {}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::NotFound => write!(f, "Not found"),
            AccessError::Forbidden => write!(f, "Forbidden"),
            AccessError::Conflict => write!(f, "Already exists"),
            AccessError::Validation(msg) => write!(f, "Invalid input: {msg}"),
            AccessError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            AccessError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}
