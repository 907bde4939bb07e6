use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repository::OrgRepository;
use crate::types::Org;
use crate::AccessError;

#[derive(Clone)]
pub struct PostgresOrgRepository {
    pool: PgPool,
}

impl PostgresOrgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct OrgRecord {
    id: i64,
    domain: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrgRecord> for Org {
    fn from(row: OrgRecord) -> Self {
        Org {
            id: row.id,
            domain: row.domain,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl OrgRepository for PostgresOrgRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Org>, AccessError> {
        let row: Option<OrgRecord> = sqlx::query_as(
            "SELECT id, domain, name, created_at, updated_at FROM orgs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"find_org_by_id\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_domain(&self, domain: &str) -> Result<Option<Org>, AccessError> {
        let row: Option<OrgRecord> = sqlx::query_as(
            "SELECT id, domain, name, created_at, updated_at FROM orgs WHERE domain = $1",
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            log::error!(target: "orgward", "msg=\"database error\", operation=\"find_org_by_domain\", error=\"{e}\"");
            AccessError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(Into::into))
    }
}
