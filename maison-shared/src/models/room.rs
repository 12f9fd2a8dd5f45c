/// Rooms of a household
///
/// Rooms always belong to a household and are deleted with it. Pets, devices,
/// tasks and inventory items may point at a room; the reference is cleared
/// when the room goes away.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: Uuid,
    pub household_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoom {
    pub household_id: Uuid,
    pub name: String,
}

impl Room {
    pub async fn create(pool: &PgPool, data: CreateRoom) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (household_id, name)
            VALUES ($1, $2)
            RETURNING id, household_id, name, created_at
            "#,
        )
        .bind(data.household_id)
        .bind(data.name)
        .fetch_one(pool)
        .await
    }

    /// Finds a room only if it belongs to `household_id`
    ///
    /// Used to reject form posts that reference another household's room.
    pub async fn find_in_household(
        pool: &PgPool,
        id: Uuid,
        household_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            r#"
            SELECT id, household_id, name, created_at
            FROM rooms
            WHERE id = $1 AND household_id = $2
            "#,
        )
        .bind(id)
        .bind(household_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            r#"
            SELECT id, household_id, name, created_at
            FROM rooms
            WHERE household_id = $1
            ORDER BY name
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }
}
