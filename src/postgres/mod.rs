//! `PostgreSQL` implementations of the repository traits.

mod membership;
mod org;
mod role;
mod user;

pub mod migrations;

pub use membership::PostgresMembershipRepository;
pub use org::PostgresOrgRepository;
pub use role::PostgresRoleRepository;
pub use user::PostgresUserRepository;

use sqlx::PgPool;

/// Creates all Postgres repository instances from a connection pool.
pub fn create_repositories(
    pool: PgPool,
) -> (
    PostgresUserRepository,
    PostgresOrgRepository,
    PostgresRoleRepository,
    PostgresMembershipRepository,
) {
    (
        PostgresUserRepository::new(pool.clone()),
        PostgresOrgRepository::new(pool.clone()),
        PostgresRoleRepository::new(pool.clone()),
        PostgresMembershipRepository::new(pool),
    )
}
