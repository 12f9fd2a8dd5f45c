/// Task completion log and repetition schedule
///
/// Every completion leaves a [`TaskHistoryEntry`], written in the same
/// transaction as the status change (see [`Task::complete`](super::task::Task::complete)).
/// A task may also carry a [`TaskRecurrence`]: how often the chore comes back
/// and when it was last done, from which the next occurrence is derived.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_frequency AS ENUM ('daily', 'weekly', 'monthly');
///
/// CREATE TABLE task_history (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     member_id UUID REFERENCES members(id) ON DELETE SET NULL,
///     completed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     duration_minutes INTEGER CHECK (duration_minutes >= 0),
///     comment TEXT NOT NULL DEFAULT ''
/// );
///
/// CREATE TABLE task_recurrences (
///     task_id UUID PRIMARY KEY REFERENCES tasks(id) ON DELETE CASCADE,
///     frequency task_frequency NOT NULL,
///     last_run DATE,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use std::str::FromStr;
use uuid::Uuid;

/// Free-text details of a completion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionNote {
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub comment: String,
}

/// One completion, joined with the completing member's name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskHistoryEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub member_id: Option<Uuid>,
    /// None once the member account is deleted
    pub display_name: Option<String>,
    pub completed_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub comment: String,
}

impl TaskHistoryEntry {
    pub async fn record_with<'e, E>(
        executor: E,
        task_id: Uuid,
        member_id: Uuid,
        note: &CompletionNote,
    ) -> Result<Uuid, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar(
            r#"
            INSERT INTO task_history (task_id, member_id, duration_minutes, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(task_id)
        .bind(member_id)
        .bind(note.duration_minutes)
        .bind(&note.comment)
        .fetch_one(executor)
        .await
    }

    /// Completions of a task, most recent first
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskHistoryEntry>(
            r#"
            SELECT h.id, h.task_id, h.member_id, m.display_name, h.completed_at,
                   h.duration_minutes, h.comment
            FROM task_history h
            LEFT JOIN members m ON m.id = h.member_id
            WHERE h.task_id = $1
            ORDER BY h.completed_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl TaskFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFrequency::Daily => "daily",
            TaskFrequency::Weekly => "weekly",
            TaskFrequency::Monthly => "monthly",
        }
    }

    /// The date one period after `from`
    ///
    /// Monthly steps clamp to the end of shorter months (31 Jan → 28/29 Feb).
    pub fn next_after(&self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            TaskFrequency::Daily => from.succ_opt(),
            TaskFrequency::Weekly => from.checked_add_days(Days::new(7)),
            TaskFrequency::Monthly => from.checked_add_months(Months::new(1)),
        }
    }
}

impl FromStr for TaskFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "quotidien" => Ok(TaskFrequency::Daily),
            "weekly" | "hebdo" | "hebdomadaire" => Ok(TaskFrequency::Weekly),
            "monthly" | "mensuel" => Ok(TaskFrequency::Monthly),
            other => Err(format!("Unknown frequency: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskRecurrence {
    pub task_id: Uuid,
    pub frequency: TaskFrequency,
    pub last_run: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecurrence {
    /// Sets how often a task repeats, keeping its last run
    pub async fn set(
        pool: &PgPool,
        task_id: Uuid,
        frequency: TaskFrequency,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskRecurrence>(
            r#"
            INSERT INTO task_recurrences (task_id, frequency)
            VALUES ($1, $2)
            ON CONFLICT (task_id) DO UPDATE
            SET frequency = EXCLUDED.frequency,
                updated_at = NOW()
            RETURNING task_id, frequency, last_run, updated_at
            "#,
        )
        .bind(task_id)
        .bind(frequency)
        .fetch_one(pool)
        .await
    }

    /// Records a run on `day`; no-op for a task without recurrence
    pub async fn mark_run_with<'e, E>(
        executor: E,
        task_id: Uuid,
        day: NaiveDate,
    ) -> Result<(), sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE task_recurrences
            SET last_run = $2,
                updated_at = NOW()
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .bind(day)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskRecurrence>(
            r#"
            SELECT r.task_id, r.frequency, r.last_run, r.updated_at
            FROM task_recurrences r
            JOIN tasks t ON t.id = r.task_id
            WHERE t.household_id = $1
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    /// When the chore is due again; None if it never ran
    pub fn next_run(&self) -> Option<NaiveDate> {
        self.last_run.and_then(|day| self.frequency.next_after(day))
    }
}
