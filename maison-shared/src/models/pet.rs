use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A household pet
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub household_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePet {
    pub name: String,
    pub household_id: Uuid,
    pub room_id: Option<Uuid>,
}

impl Pet {
    pub async fn create(pool: &PgPool, data: CreatePet) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Pet>(
            r#"
            INSERT INTO pets (name, household_id, room_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, household_id, room_id, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.household_id)
        .bind(data.room_id)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Pet>(
            r#"
            SELECT id, name, household_id, room_id, created_at
            FROM pets
            WHERE household_id = $1
            ORDER BY name
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }
}
