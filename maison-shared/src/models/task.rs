/// Household task (chore) model and database operations
///
/// Tasks are created by a household admin, inherit the admin's household,
/// may be assigned to several members and are completed at most once.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('high', 'medium', 'low');
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done', 'cancelled');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     household_id UUID REFERENCES households(id) ON DELETE SET NULL,
///     room_id UUID REFERENCES rooms(id) ON DELETE SET NULL,
///     title VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     due_date DATE,
///     priority task_priority,
///     status task_status NOT NULL DEFAULT 'todo',
///     created_by UUID REFERENCES members(id) ON DELETE SET NULL,
///     completed_at TIMESTAMPTZ,
///     completed_by UUID REFERENCES members(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_assignments (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     member_id UUID NOT NULL REFERENCES members(id) ON DELETE CASCADE,
///     assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (task_id, member_id)
/// );
/// ```
///
/// # State Machine
///
/// ```text
/// todo ──► in_progress ──► done
///   │           │
///   └───────────┴────────► cancelled
/// ```
///
/// `done` and `cancelled` are terminal. Completion is a conditional update, so
/// two members completing the same task concurrently cannot both succeed.
///
/// # Example
///
/// ```no_run
/// use maison_shared::models::task::{CreateTask, Task, TaskPriority};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, household_id: Uuid, admin_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     household_id,
///     room_id: None,
///     title: "Sortir les poubelles".to_string(),
///     description: String::new(),
///     due_date: None,
///     priority: Some(TaskPriority::High),
///     status: Default::default(),
///     created_by: admin_id,
/// }).await?;
///
/// Task::complete(&pool, task.id, admin_id, &Default::default()).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use super::task_history::{CompletionNote, TaskHistoryEntry, TaskRecurrence};

/// Maximum length of a task title
pub const MAX_TITLE_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "haute" => Ok(TaskPriority::High),
            "medium" | "moyenne" => Ok(TaskPriority::Medium),
            "low" | "basse" => Ok(TaskPriority::Low),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Done or cancelled
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" | "a_faire" | "à faire" => Ok(TaskStatus::Todo),
            "in_progress" | "en_cours" | "en cours" => Ok(TaskStatus::InProgress),
            "done" | "terminee" | "terminée" => Ok(TaskStatus::Done),
            "cancelled" | "annulee" | "annulée" => Ok(TaskStatus::Cancelled),
            other => Err(format!("Unknown status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub household_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<TaskPriority>,
    pub status: TaskStatus,
    pub created_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Household of the creating admin
    pub household_id: Uuid,
    pub room_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_by: Uuid,
}

/// A member assigned to a task, joined with the member's display name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskAssignee {
    pub task_id: Uuid,
    pub member_id: Uuid,
    pub display_name: String,
    pub assigned_at: DateTime<Utc>,
}

impl Task {
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (household_id, room_id, title, description, due_date,
                               priority, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, household_id, room_id, title, description, due_date, priority,
                      status, created_by, completed_at, completed_by, created_at, updated_at
            "#,
        )
        .bind(data.household_id)
        .bind(data.room_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(data.status)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, household_id, room_id, title, description, due_date, priority,
                   status, created_by, completed_at, completed_by, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Tasks of a household, newest first
    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, household_id, room_id, title, description, due_date, priority,
                   status, created_by, completed_at, completed_by, created_at, updated_at
            FROM tasks
            WHERE household_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }

    /// Marks a task done
    ///
    /// Only tasks in `todo` or `in_progress` transition. The completion is
    /// logged to the task history, and a recurring task records the day as its
    /// last run, in the same transaction.
    ///
    /// # Returns
    ///
    /// The completed task, or None if the task doesn't exist or was already
    /// done or cancelled
    pub async fn complete(
        pool: &PgPool,
        id: Uuid,
        member_id: Uuid,
        note: &CompletionNote,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let completed = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = 'done',
                completed_at = NOW(),
                completed_by = $2,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('todo', 'in_progress')
            RETURNING id, household_id, room_id, title, description, due_date, priority,
                      status, created_by, completed_at, completed_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(member_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(task) = completed else {
            return Ok(None);
        };

        TaskHistoryEntry::record_with(&mut *tx, task.id, member_id, note).await?;

        let day = task.completed_at.unwrap_or_else(Utc::now).date_naive();
        TaskRecurrence::mark_run_with(&mut *tx, task.id, day).await?;

        tx.commit().await?;

        Ok(Some(task))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Assigns a member to a task
    ///
    /// # Returns
    ///
    /// False if the member was already assigned
    pub async fn assign(pool: &PgPool, id: Uuid, member_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO task_assignments (task_id, member_id)
            VALUES ($1, $2)
            ON CONFLICT (task_id, member_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(member_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Assignees of every task in a household
    pub async fn assignees_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<TaskAssignee>, sqlx::Error> {
        sqlx::query_as::<_, TaskAssignee>(
            r#"
            SELECT a.task_id, a.member_id, m.display_name, a.assigned_at
            FROM task_assignments a
            JOIN tasks t ON t.id = a.task_id
            JOIN members m ON m.id = a.member_id
            WHERE t.household_id = $1
            ORDER BY a.assigned_at
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }
}
