/// Budgets and expenses
///
/// A household has at most one budget per period (month or year). Setting a
/// budget again replaces its total and resets the remaining amount. Recording
/// an expense decrements the remaining amount of every budget of the
/// household in the same transaction as the expense insert.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE budget_period AS ENUM ('month', 'year');
///
/// CREATE TABLE budgets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     household_id UUID REFERENCES households(id) ON DELETE SET NULL,
///     period budget_period NOT NULL,
///     total_amount NUMERIC(10, 2) NOT NULL CHECK (total_amount >= 0),
///     remaining_amount NUMERIC(10, 2) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (household_id, period)
/// );
///
/// CREATE TABLE expenses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     description VARCHAR(255) NOT NULL,
///     amount NUMERIC(10, 2) NOT NULL CHECK (amount > 0),
///     spent_on DATE NOT NULL,
///     household_id UUID REFERENCES households(id) ON DELETE SET NULL,
///     member_id UUID REFERENCES members(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The remaining amount may go negative; overspending is shown, not refused.
/// It bottoms out at the column's lower bound (`-99999999.99`), so an
/// overspent budget never blocks later expenses.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use super::numeric_max;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "budget_period", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Month,
    Year,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Month => "month",
            BudgetPeriod::Year => "year",
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" | "mois" => Ok(BudgetPeriod::Month),
            "year" | "annee" | "année" => Ok(BudgetPeriod::Year),
            other => Err(format!("Unknown budget period: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Budget {
    pub id: Uuid,
    pub household_id: Option<Uuid>,
    pub period: BudgetPeriod,
    pub total_amount: Decimal,
    pub remaining_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub spent_on: NaiveDate,
    pub household_id: Option<Uuid>,
    pub member_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpense {
    pub description: String,
    /// Strictly positive
    pub amount: Decimal,
    pub spent_on: NaiveDate,
    pub household_id: Uuid,
    pub member_id: Uuid,
}

impl Budget {
    /// Creates or replaces the household's budget for `period`
    pub async fn set(
        pool: &PgPool,
        household_id: Uuid,
        period: BudgetPeriod,
        total_amount: Decimal,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (household_id, period, total_amount, remaining_amount)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (household_id, period) DO UPDATE
            SET total_amount = EXCLUDED.total_amount,
                remaining_amount = EXCLUDED.total_amount,
                updated_at = NOW()
            RETURNING id, household_id, period, total_amount, remaining_amount,
                      created_at, updated_at
            "#,
        )
        .bind(household_id)
        .bind(period)
        .bind(total_amount)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, household_id, period, total_amount, remaining_amount,
                   created_at, updated_at
            FROM budgets
            WHERE household_id = $1
            ORDER BY period
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }
}

impl Expense {
    /// Records an expense and charges it to the household's budgets
    ///
    /// Both writes happen in one transaction.
    pub async fn record(pool: &PgPool, data: CreateExpense) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (description, amount, spent_on, household_id, member_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, description, amount, spent_on, household_id, member_id, created_at
            "#,
        )
        .bind(&data.description)
        .bind(data.amount)
        .bind(data.spent_on)
        .bind(data.household_id)
        .bind(data.member_id)
        .fetch_one(&mut *tx)
        .await?;

        let charged = sqlx::query(
            r#"
            UPDATE budgets
            SET remaining_amount = GREATEST(remaining_amount - $2, $3),
                updated_at = NOW()
            WHERE household_id = $1
            "#,
        )
        .bind(data.household_id)
        .bind(data.amount)
        .bind(-numeric_max())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            expense_id = %expense.id,
            budgets_charged = charged.rows_affected(),
            "Expense recorded"
        );

        Ok(expense)
    }

    /// Most recent expenses of a household
    pub async fn list_recent(
        pool: &PgPool,
        household_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, description, amount, spent_on, household_id, member_id, created_at
            FROM expenses
            WHERE household_id = $1
            ORDER BY spent_on DESC, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(household_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
