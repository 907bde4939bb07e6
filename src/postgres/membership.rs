use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::permissions::PermissionSet;
use crate::repository::{CreateMembership, MembershipRepository};
use crate::types::{ListQuery, MemberDetails, Membership, Role, RoleAssignment, User};
use crate::AccessError;

#[derive(Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct MembershipRecord {
    user_id: i64,
    org_id: i64,
    role_type: String,
    role_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn assignment_to_columns(role: RoleAssignment) -> (&'static str, Option<i64>) {
    match role {
        RoleAssignment::Owner => ("owner", None),
        RoleAssignment::Custom { role_id } => ("custom", Some(role_id)),
    }
}

fn assignment_from_columns(
    role_type: &str,
    role_id: Option<i64>,
) -> Result<RoleAssignment, AccessError> {
    match (role_type, role_id) {
        ("owner", None) => Ok(RoleAssignment::Owner),
        ("custom", Some(role_id)) => Ok(RoleAssignment::Custom { role_id }),
        _ => {
            log::error!(
                target: "orgward",
                "msg=\"invalid role assignment in database\", role_type=\"{role_type}\", role_id={role_id:?}"
            );
            Err(AccessError::Internal(
                "invalid role assignment in database".into(),
            ))
        }
    }
}

impl TryFrom<MembershipRecord> for Membership {
    type Error = AccessError;

    fn try_from(row: MembershipRecord) -> Result<Self, Self::Error> {
        Ok(Membership {
            user_id: row.user_id,
            org_id: row.org_id,
            role: assignment_from_columns(&row.role_type, row.role_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// One row of the member listing: membership columns joined with the user
/// and, when present, the role.
#[derive(FromRow)]
struct MemberRow {
    user_id: i64,
    org_id: i64,
    role_type: String,
    role_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_email: String,
    user_name: String,
    user_created_at: DateTime<Utc>,
    user_updated_at: DateTime<Utc>,
    joined_role_id: Option<i64>,
    role_org_id: Option<i64>,
    role_name: Option<String>,
    role_permissions: Option<serde_json::Value>,
    role_created_at: Option<DateTime<Utc>>,
    role_updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<MemberRow> for MemberDetails {
    type Error = AccessError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let membership = Membership {
            user_id: row.user_id,
            org_id: row.org_id,
            role: assignment_from_columns(&row.role_type, row.role_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        let user = User {
            id: row.user_id,
            email: row.user_email,
            name: row.user_name,
            created_at: row.user_created_at,
            updated_at: row.user_updated_at,
        };

        let role = match (
            row.joined_role_id,
            row.role_org_id,
            row.role_name,
            row.role_permissions,
            row.role_created_at,
            row.role_updated_at,
        ) {
            (Some(id), Some(org_id), Some(name), Some(permissions), Some(created_at), Some(updated_at)) => {
                let permissions: PermissionSet =
                    serde_json::from_value(permissions).map_err(|e| {
                        log::error!(target: "orgward", "msg=\"invalid permission format\", role_id={id}, error=\"{e}\"");
                        AccessError::Internal("invalid permission format in database".into())
                    })?;
                Some(Role {
                    id,
                    org_id,
                    name,
                    permissions,
                    created_at,
                    updated_at,
                })
            }
            _ => None,
        };

        Ok(MemberDetails {
            membership,
            user,
            role,
        })
    }
}

const MEMBERSHIP_COLUMNS: &str = "user_id, org_id, role_type, role_id, created_at, updated_at";

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateMembership) -> Result<Membership, AccessError> {
        let (role_type, role_id) = assignment_to_columns(data.role);

        let row: MembershipRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO memberships (user_id, org_id, role_type, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {MEMBERSHIP_COLUMNS}
            "
        ))
        .bind(data.user_id)
        .bind(data.org_id)
        .bind(role_type)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                return AccessError::Conflict;
            }
            log::error!(target: "orgward", "msg=\"database error\", operation=\"create_membership\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find(&self, user_id: i64, org_id: i64) -> Result<Option<Membership>, AccessError> {
        let row: Option<MembershipRecord> = sqlx::query_as(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE user_id = $1 AND org_id = $2"
        ))
        .bind(user_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"find_membership\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list(
        &self,
        org_id: i64,
        query: &ListQuery,
    ) -> Result<(Vec<MemberDetails>, u64), AccessError> {
        let search = query.search_term();

        let rows: Vec<MemberRow> = sqlx::query_as(
            r"
            SELECT
                m.user_id, m.org_id, m.role_type, m.role_id,
                m.created_at, m.updated_at,
                u.email AS user_email, u.name AS user_name,
                u.created_at AS user_created_at, u.updated_at AS user_updated_at,
                r.id AS joined_role_id, r.org_id AS role_org_id, r.name AS role_name,
                r.permissions AS role_permissions,
                r.created_at AS role_created_at, r.updated_at AS role_updated_at
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            LEFT JOIN roles r ON r.id = m.role_id AND r.org_id = m.org_id
            WHERE m.org_id = $1
              AND ($2::TEXT IS NULL
                   OR u.name ILIKE '%' || $2 || '%'
                   OR u.email ILIKE '%' || $2 || '%')
            ORDER BY u.name ASC, u.id ASC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(org_id)
        .bind(search)
        .bind(i64::from(query.per_page))
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"list_members\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        let (total,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*)
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.org_id = $1
              AND ($2::TEXT IS NULL
                   OR u.name ILIKE '%' || $2 || '%'
                   OR u.email ILIKE '%' || $2 || '%')
            ",
        )
        .bind(org_id)
        .bind(search)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"count_members\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        let members = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<MemberDetails>, _>>()?;

        Ok((members, total as u64))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_role(
        &self,
        user_id: i64,
        org_id: i64,
        role: RoleAssignment,
    ) -> Result<Membership, AccessError> {
        let (role_type, role_id) = assignment_to_columns(role);

        let row: Option<MembershipRecord> = sqlx::query_as(&format!(
            r"
            UPDATE memberships SET role_type = $1, role_id = $2, updated_at = NOW()
            WHERE user_id = $3 AND org_id = $4
            RETURNING {MEMBERSHIP_COLUMNS}
            "
        ))
        .bind(role_type)
        .bind(role_id)
        .bind(user_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"update_membership_role\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        row.ok_or(AccessError::NotFound)?.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, user_id: i64, org_id: i64) -> Result<(), AccessError> {
        sqlx::query("DELETE FROM memberships WHERE user_id = $1 AND org_id = $2")
            .bind(user_id)
            .bind(org_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "orgward", "msg=\"database error\", operation=\"delete_membership\", error=\"{e}\"");
                AccessError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_column_roundtrip() {
        for role in [RoleAssignment::Owner, RoleAssignment::Custom { role_id: 7 }] {
            let (role_type, role_id) = assignment_to_columns(role);
            let parsed = assignment_from_columns(role_type, role_id).unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_assignment_rejects_inconsistent_columns() {
        assert!(assignment_from_columns("owner", Some(3)).is_err());
        assert!(assignment_from_columns("custom", None).is_err());
        assert!(assignment_from_columns("admin", None).is_err());
    }
}
