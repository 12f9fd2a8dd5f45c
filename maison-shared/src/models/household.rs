/// Household model and database operations
///
/// A household ("foyer") is the unit every other record is scoped to. Deleting
/// one cascades to its rooms and pending invitations; members, tasks, pets,
/// devices, inventory and budgets are detached (their `household_id` is
/// cleared) and survive.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE households (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     room_count INTEGER CHECK (room_count IS NULL OR room_count >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use maison_shared::models::household::{CreateHousehold, Household};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let household = Household::create(&pool, CreateHousehold {
///     name: "Rue des Lilas".to_string(),
///     room_count: Some(4),
/// }).await?;
///
/// assert!(Household::exists(&pool, household.id).await?);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Maximum length of a household name
pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Household {
    pub id: Uuid,

    /// Display name (1-100 characters)
    pub name: String,

    /// Number of rooms declared at creation, not the number of `rooms` rows
    pub room_count: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a household
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHousehold {
    pub name: String,
    pub room_count: Option<i32>,
}

impl Household {
    /// Creates a household
    ///
    /// # Errors
    ///
    /// Returns an error if `room_count` is negative (check constraint) or the
    /// database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateHousehold) -> Result<Self, sqlx::Error> {
        Self::create_with(pool, data).await
    }

    /// Creates a household inside an open transaction
    pub async fn create_with<'e, E>(executor: E, data: CreateHousehold) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Household>(
            r#"
            INSERT INTO households (name, room_count)
            VALUES ($1, $2)
            RETURNING id, name, room_count, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.room_count)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Household>(
            r#"
            SELECT id, name, room_count, created_at, updated_at
            FROM households
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM households WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Deletes a household
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM households WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
