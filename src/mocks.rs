//! In-memory repository implementations for tests and prototyping.
//!
//! Handles are cheap clones over shared state, like the pooled database
//! repositories: clone a repository to hand it to an action while keeping a
//! handle for assertions. `MockMembershipRepository` is constructed from the
//! user and role mocks so its listing can join the way a database would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::repository::{
    CreateMembership, CreateRole, MembershipRepository, OrgRepository, RoleRepository,
    UpdateRole, UserRepository,
};
use crate::types::{ListQuery, MemberDetails, Membership, Org, Role, User};
use crate::AccessError;

fn poisoned() -> AccessError {
    AccessError::Internal("lock poisoned".into())
}

#[derive(Clone)]
pub struct MockUserRepository {
    users: Arc<RwLock<HashMap<i64, User>>>,
    next_id: Arc<AtomicI64>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MockUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AccessError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccessError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn upsert_by_email(&self, email: &str, name: &str) -> Result<User, AccessError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;

        if let Some(existing) = users.values().find(|u| u.email == email) {
            return Ok(existing.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let user = User {
            id,
            email: email.to_owned(),
            name: name.to_owned(),
            created_at: now,
            updated_at: now,
        };
        users.insert(id, user.clone());

        Ok(user)
    }
}

#[derive(Clone)]
pub struct MockOrgRepository {
    orgs: Arc<RwLock<HashMap<i64, Org>>>,
    next_id: Arc<AtomicI64>,
}

impl MockOrgRepository {
    pub fn new() -> Self {
        Self {
            orgs: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Seed an organization. Org lifecycle is outside the core, so the mock
    /// grows a helper instead of the trait.
    pub fn seed(&self, domain: &str, name: &str) -> Result<Org, AccessError> {
        let mut orgs = self.orgs.write().map_err(|_| poisoned())?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let org = Org {
            id,
            domain: domain.to_owned(),
            name: name.to_owned(),
            created_at: now,
            updated_at: now,
        };
        orgs.insert(id, org.clone());

        Ok(org)
    }
}

impl Default for MockOrgRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrgRepository for MockOrgRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Org>, AccessError> {
        let orgs = self.orgs.read().map_err(|_| poisoned())?;
        Ok(orgs.get(&id).cloned())
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Org>, AccessError> {
        let orgs = self.orgs.read().map_err(|_| poisoned())?;
        Ok(orgs.values().find(|o| o.domain == domain).cloned())
    }
}

#[derive(Clone)]
pub struct MockRoleRepository {
    roles: Arc<RwLock<HashMap<i64, Role>>>,
    next_id: Arc<AtomicI64>,
}

impl MockRoleRepository {
    pub fn new() -> Self {
        Self {
            roles: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MockRoleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleRepository for MockRoleRepository {
    async fn create(&self, data: CreateRole) -> Result<Role, AccessError> {
        let mut roles = self.roles.write().map_err(|_| poisoned())?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let role = Role {
            id,
            org_id: data.org_id,
            name: data.name,
            permissions: data.permissions,
            created_at: now,
            updated_at: now,
        };
        roles.insert(id, role.clone());

        Ok(role)
    }

    async fn find_by_id(&self, role_id: i64) -> Result<Option<Role>, AccessError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        Ok(roles.get(&role_id).cloned())
    }

    async fn list(
        &self,
        org_id: i64,
        query: &ListQuery,
    ) -> Result<(Vec<Role>, u64), AccessError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;

        let needle = query.search_term().map(str::to_lowercase);
        let mut matching: Vec<Role> = roles
            .values()
            .filter(|r| r.org_id == org_id)
            .filter(|r| match &needle {
                Some(n) => r.name.to_lowercase().contains(n),
                None => true,
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            (a.name.to_lowercase(), a.id).cmp(&(b.name.to_lowercase(), b.id))
        });

        let total = matching.len() as u64;
        let page: Vec<Role> = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page as usize)
            .collect();

        Ok((page, total))
    }

    async fn update(
        &self,
        role_id: i64,
        org_id: i64,
        changes: UpdateRole,
    ) -> Result<Role, AccessError> {
        let mut roles = self.roles.write().map_err(|_| poisoned())?;

        let role = roles
            .get_mut(&role_id)
            .filter(|r| r.org_id == org_id)
            .ok_or(AccessError::NotFound)?;

        if let Some(name) = changes.name {
            role.name = name;
        }
        if let Some(permissions) = changes.permissions {
            role.permissions = permissions;
        }
        role.updated_at = Utc::now();

        Ok(role.clone())
    }

    async fn delete(&self, role_id: i64, org_id: i64) -> Result<(), AccessError> {
        let mut roles = self.roles.write().map_err(|_| poisoned())?;

        match roles.get(&role_id) {
            Some(role) if role.org_id == org_id => {
                roles.remove(&role_id);
                Ok(())
            }
            _ => Err(AccessError::NotFound),
        }
    }
}

#[derive(Clone)]
pub struct MockMembershipRepository {
    memberships: Arc<RwLock<HashMap<(i64, i64), Membership>>>,
    users: MockUserRepository,
    roles: MockRoleRepository,
}

impl MockMembershipRepository {
    /// The membership mock joins against the user and role mocks, so it is
    /// built from handles to both.
    pub fn new(users: MockUserRepository, roles: MockRoleRepository) -> Self {
        Self {
            memberships: Arc::new(RwLock::new(HashMap::new())),
            users,
            roles,
        }
    }
}

#[async_trait]
impl MembershipRepository for MockMembershipRepository {
    async fn create(&self, data: CreateMembership) -> Result<Membership, AccessError> {
        let mut memberships = self.memberships.write().map_err(|_| poisoned())?;

        let key = (data.user_id, data.org_id);
        if memberships.contains_key(&key) {
            return Err(AccessError::Conflict);
        }

        let now = Utc::now();
        let membership = Membership {
            user_id: data.user_id,
            org_id: data.org_id,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        memberships.insert(key, membership.clone());

        Ok(membership)
    }

    async fn find(&self, user_id: i64, org_id: i64) -> Result<Option<Membership>, AccessError> {
        let memberships = self.memberships.read().map_err(|_| poisoned())?;
        Ok(memberships.get(&(user_id, org_id)).cloned())
    }

    async fn list(
        &self,
        org_id: i64,
        query: &ListQuery,
    ) -> Result<(Vec<MemberDetails>, u64), AccessError> {
        let org_members: Vec<Membership> = {
            let memberships = self.memberships.read().map_err(|_| poisoned())?;
            memberships
                .values()
                .filter(|m| m.org_id == org_id)
                .cloned()
                .collect()
        };

        let mut rows = Vec::with_capacity(org_members.len());
        for membership in org_members {
            let user = self
                .users
                .find_by_id(membership.user_id)
                .await?
                .ok_or_else(|| AccessError::Internal("membership without user".into()))?;

            let role = match membership.role.role_id() {
                Some(role_id) => self
                    .roles
                    .find_by_id(role_id)
                    .await?
                    .filter(|r| r.org_id == org_id),
                None => None,
            };

            rows.push(MemberDetails {
                membership,
                user,
                role,
            });
        }

        let needle = query.search_term().map(str::to_lowercase);
        if let Some(n) = &needle {
            rows.retain(|row| {
                row.user.name.to_lowercase().contains(n)
                    || row.user.email.to_lowercase().contains(n)
            });
        }

        rows.sort_by(|a, b| {
            (a.user.name.to_lowercase(), a.user.id)
                .cmp(&(b.user.name.to_lowercase(), b.user.id))
        });

        let total = rows.len() as u64;
        let page: Vec<MemberDetails> = rows
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page as usize)
            .collect();

        Ok((page, total))
    }

    async fn update_role(
        &self,
        user_id: i64,
        org_id: i64,
        role: crate::types::RoleAssignment,
    ) -> Result<Membership, AccessError> {
        let mut memberships = self.memberships.write().map_err(|_| poisoned())?;

        let membership = memberships
            .get_mut(&(user_id, org_id))
            .ok_or(AccessError::NotFound)?;

        membership.role = role;
        membership.updated_at = Utc::now();

        Ok(membership.clone())
    }

    async fn delete(&self, user_id: i64, org_id: i64) -> Result<(), AccessError> {
        let mut memberships = self.memberships.write().map_err(|_| poisoned())?;
        memberships.remove(&(user_id, org_id));
        Ok(())
    }
}
