/// Household inventory
///
/// Quantities are `NUMERIC(10, 2)` and never negative.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub household_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInventoryItem {
    pub name: String,
    pub quantity: Decimal,
    pub household_id: Uuid,
    pub room_id: Option<Uuid>,
}

impl InventoryItem {
    /// Adds an item
    ///
    /// The quantity is rounded to two decimal places by the column type.
    pub async fn create(pool: &PgPool, data: CreateInventoryItem) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items (name, quantity, household_id, room_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, quantity, household_id, room_id, added_at
            "#,
        )
        .bind(data.name)
        .bind(data.quantity)
        .bind(data.household_id)
        .bind(data.room_id)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT id, name, quantity, household_id, room_id, added_at
            FROM inventory_items
            WHERE household_id = $1
            ORDER BY name
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }
}
