use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::permissions::PermissionSet;
use crate::repository::{CreateRole, RoleRepository, UpdateRole};
use crate::types::{ListQuery, Role};
use crate::AccessError;

#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RoleRecord {
    id: i64,
    org_id: i64,
    name: String,
    permissions: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoleRecord> for Role {
    type Error = AccessError;

    fn try_from(row: RoleRecord) -> Result<Self, Self::Error> {
        let permissions: PermissionSet =
            serde_json::from_value(row.permissions).map_err(|e| {
                log::error!(target: "orgward", "msg=\"invalid permission format\", role_id={}, error=\"{e}\"", row.id);
                AccessError::Internal("invalid permission format in database".into())
            })?;

        Ok(Role {
            id: row.id,
            org_id: row.org_id,
            name: row.name,
            permissions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn permissions_to_json(permissions: PermissionSet) -> Result<serde_json::Value, AccessError> {
    serde_json::to_value(permissions).map_err(|e| AccessError::Internal(e.to_string()))
}

const ROLE_COLUMNS: &str = "id, org_id, name, permissions, created_at, updated_at";

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateRole) -> Result<Role, AccessError> {
        let permissions = permissions_to_json(data.permissions)?;

        let row: RoleRecord = sqlx::query_as(
            r"
            INSERT INTO roles (org_id, name, permissions)
            VALUES ($1, $2, $3)
            RETURNING id, org_id, name, permissions, created_at, updated_at
            ",
        )
        .bind(data.org_id)
        .bind(&data.name)
        .bind(permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"create_role\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, role_id: i64) -> Result<Option<Role>, AccessError> {
        let row: Option<RoleRecord> = sqlx::query_as(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"
        ))
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"find_role_by_id\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list(
        &self,
        org_id: i64,
        query: &ListQuery,
    ) -> Result<(Vec<Role>, u64), AccessError> {
        let search = query.search_term();

        let rows: Vec<RoleRecord> = sqlx::query_as(&format!(
            r"
            SELECT {ROLE_COLUMNS} FROM roles
            WHERE org_id = $1
              AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%')
            ORDER BY name ASC, id ASC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(org_id)
        .bind(search)
        .bind(i64::from(query.per_page))
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"list_roles\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        let (total,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM roles
            WHERE org_id = $1
              AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%')
            ",
        )
        .bind(org_id)
        .bind(search)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"count_roles\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        let roles = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Role>, _>>()?;

        Ok((roles, total as u64))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update(
        &self,
        role_id: i64,
        org_id: i64,
        changes: UpdateRole,
    ) -> Result<Role, AccessError> {
        let row: Option<RoleRecord> = match (changes.name, changes.permissions) {
            (Some(name), Some(permissions)) => {
                sqlx::query_as(&format!(
                    r"
                    UPDATE roles SET name = $1, permissions = $2, updated_at = NOW()
                    WHERE id = $3 AND org_id = $4
                    RETURNING {ROLE_COLUMNS}
                    "
                ))
                .bind(name)
                .bind(permissions_to_json(permissions)?)
                .bind(role_id)
                .bind(org_id)
                .fetch_optional(&self.pool)
                .await
            }
            (Some(name), None) => {
                sqlx::query_as(&format!(
                    r"
                    UPDATE roles SET name = $1, updated_at = NOW()
                    WHERE id = $2 AND org_id = $3
                    RETURNING {ROLE_COLUMNS}
                    "
                ))
                .bind(name)
                .bind(role_id)
                .bind(org_id)
                .fetch_optional(&self.pool)
                .await
            }
            (None, Some(permissions)) => {
                sqlx::query_as(&format!(
                    r"
                    UPDATE roles SET permissions = $1, updated_at = NOW()
                    WHERE id = $2 AND org_id = $3
                    RETURNING {ROLE_COLUMNS}
                    "
                ))
                .bind(permissions_to_json(permissions)?)
                .bind(role_id)
                .bind(org_id)
                .fetch_optional(&self.pool)
                .await
            }
            (None, None) => {
                sqlx::query_as(&format!(
                    "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 AND org_id = $2"
                ))
                .bind(role_id)
                .bind(org_id)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"update_role\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        row.ok_or(AccessError::NotFound)?.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, role_id: i64, org_id: i64) -> Result<(), AccessError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1 AND org_id = $2")
            .bind(role_id)
            .bind(org_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!(target: "orgward", "msg=\"database error\", operation=\"delete_role\", error=\"{e}\"");
                AccessError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AccessError::NotFound);
        }

        Ok(())
    }
}
