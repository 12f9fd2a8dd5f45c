/// Shopping lists
///
/// A household keeps any number of lists. A list is `in_progress` while
/// items are added to it and becomes `bought` once the shopping is done;
/// a bought list is closed to new items.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE shopping_status AS ENUM ('in_progress', 'bought');
///
/// CREATE TABLE shopping_lists (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     status shopping_status NOT NULL DEFAULT 'in_progress',
///     household_id UUID REFERENCES households(id) ON DELETE SET NULL,
///     created_by UUID REFERENCES members(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE shopping_items (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     list_id UUID NOT NULL REFERENCES shopping_lists(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     quantity NUMERIC(10, 2) CHECK (quantity >= 0),
///     unit VARCHAR(20),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum length of a unit label ("kg", "bouteilles", ...)
pub const MAX_UNIT_LENGTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shopping_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShoppingStatus {
    #[default]
    InProgress,
    Bought,
}

impl ShoppingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShoppingStatus::InProgress => "in_progress",
            ShoppingStatus::Bought => "bought",
        }
    }
}

impl FromStr for ShoppingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in_progress" | "en cours" | "en_cours" => Ok(ShoppingStatus::InProgress),
            "bought" | "acheté" | "achete" => Ok(ShoppingStatus::Bought),
            other => Err(format!("Unknown shopping list status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShoppingList {
    pub id: Uuid,
    pub name: String,
    pub status: ShoppingStatus,
    pub household_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShoppingList {
    pub name: String,
    pub household_id: Uuid,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub list_id: Uuid,
    pub name: String,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShoppingItem {
    pub list_id: Uuid,
    pub name: String,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
}

impl ShoppingList {
    pub async fn create(pool: &PgPool, data: CreateShoppingList) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ShoppingList>(
            r#"
            INSERT INTO shopping_lists (name, household_id, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, name, status, household_id, created_by, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.household_id)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    /// The list, if it belongs to `household_id`
    pub async fn find_in_household(
        pool: &PgPool,
        id: Uuid,
        household_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingList>(
            r#"
            SELECT id, name, status, household_id, created_by, created_at, updated_at
            FROM shopping_lists
            WHERE id = $1 AND household_id = $2
            "#,
        )
        .bind(id)
        .bind(household_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists of a household, open ones first, newest first
    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingList>(
            r#"
            SELECT id, name, status, household_id, created_by, created_at, updated_at
            FROM shopping_lists
            WHERE household_id = $1
            ORDER BY status, created_at DESC
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    /// Closes an open list of the household
    ///
    /// # Returns
    ///
    /// The bought list, None if no open list with this id belongs to the
    /// household
    pub async fn mark_bought(
        pool: &PgPool,
        id: Uuid,
        household_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingList>(
            r#"
            UPDATE shopping_lists
            SET status = 'bought',
                updated_at = NOW()
            WHERE id = $1 AND household_id = $2 AND status = 'in_progress'
            RETURNING id, name, status, household_id, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(household_id)
        .fetch_optional(pool)
        .await
    }
}

impl ShoppingItem {
    /// Adds an item to an open list
    ///
    /// # Returns
    ///
    /// None if the list was bought in the meantime
    pub async fn create(
        pool: &PgPool,
        data: CreateShoppingItem,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingItem>(
            r#"
            INSERT INTO shopping_items (list_id, name, quantity, unit)
            SELECT id, $2, $3, $4
            FROM shopping_lists
            WHERE id = $1 AND status = 'in_progress'
            RETURNING id, list_id, name, quantity, unit, created_at
            "#,
        )
        .bind(data.list_id)
        .bind(data.name)
        .bind(data.quantity)
        .bind(data.unit)
        .fetch_optional(pool)
        .await
    }

    /// Items on every list of a household
    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ShoppingItem>(
            r#"
            SELECT i.id, i.list_id, i.name, i.quantity, i.unit, i.created_at
            FROM shopping_items i
            JOIN shopping_lists l ON l.id = i.list_id
            WHERE l.household_id = $1
            ORDER BY i.created_at
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }
}
