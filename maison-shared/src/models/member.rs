/// Member model and database operations
///
/// A member is a login account. It is attached to at most one household and
/// carries one role from a closed enumeration. Removing a household detaches
/// its members instead of deleting them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM
///     ('admin', 'treasurer', 'member', 'junior', 'guest', 'supervisor', 'observer');
///
/// CREATE TABLE members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     username VARCHAR(255) NOT NULL,
///     display_name VARCHAR(100) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role member_role NOT NULL DEFAULT 'member',
///     household_id UUID REFERENCES households(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use maison_shared::models::member::{CreateMember, Member, Role};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let member = Member::create(&pool, CreateMember {
///     email: "alice@example.com".to_string(),
///     display_name: "Alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::Member,
///     household_id: None,
/// }).await?;
///
/// let found = Member::find_by_email(&pool, "ALICE@example.com").await?;
/// assert_eq!(found.map(|m| m.id), Some(member.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Household role of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages the household: members, invitations, rooms, tasks
    Admin,

    /// Manages the budget and records expenses
    Treasurer,

    /// Regular household member
    Member,

    /// Child member
    Junior,

    /// Temporary guest with limited rights
    Guest,

    /// Oversees tasks without administering the household
    Supervisor,

    /// Read-only access
    Observer,
}

/// Returned when a role label does not name a known role
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::Treasurer,
        Role::Member,
        Role::Junior,
        Role::Guest,
        Role::Supervisor,
        Role::Observer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Treasurer => "treasurer",
            Role::Member => "member",
            Role::Junior => "junior",
            Role::Guest => "guest",
            Role::Supervisor => "supervisor",
            Role::Observer => "observer",
        }
    }

    /// Administers the household: invitations, rooms, members, tasks
    pub fn can_manage_household(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Sets budgets and records expenses
    pub fn can_manage_budget(&self) -> bool {
        matches!(self, Role::Admin | Role::Treasurer)
    }

    /// Adds inventory items
    pub fn can_edit_inventory(&self) -> bool {
        !matches!(self, Role::Guest | Role::Observer)
    }

    /// Marks household tasks as done
    pub fn can_complete_tasks(&self) -> bool {
        !matches!(self, Role::Observer)
    }

    /// Switches household devices on and off
    pub fn can_operate_devices(&self) -> bool {
        !matches!(self, Role::Guest | Role::Observer)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Member
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts the stored names as well as the French labels used by the
    /// household forms (`tresorier`, `membre`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "treasurer" | "tresorier" | "trésorier" => Ok(Role::Treasurer),
            "member" | "membre" => Ok(Role::Member),
            "junior" => Ok(Role::Junior),
            "guest" | "invite" | "invité" => Ok(Role::Guest),
            "supervisor" | "superviseur" => Ok(Role::Supervisor),
            "observer" | "observateur" => Ok(Role::Observer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A household member account
///
/// `password_hash` is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: Uuid,

    /// Login key, unique and case-insensitive
    pub email: String,

    /// Always equal to the email
    pub username: String,

    pub display_name: String,

    /// Argon2id PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: Role,

    /// Household the member belongs to, if any
    pub household_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Member {
    /// Whether the member belongs to `household_id`
    pub fn belongs_to(&self, household_id: Uuid) -> bool {
        self.household_id == Some(household_id)
    }

    /// Admin attached to `household_id`
    pub fn administers(&self, household_id: Uuid) -> bool {
        self.role.can_manage_household() && self.belongs_to(household_id)
    }
}

/// Input for creating a member
#[derive(Debug, Clone)]
pub struct CreateMember {
    /// Also used as the username
    pub email: String,
    pub display_name: String,
    /// Argon2id hash, never the plaintext password
    pub password_hash: String,
    pub role: Role,
    pub household_id: Option<Uuid>,
}

const MEMBER_COLUMNS: &str = "id, email::TEXT AS email, username, display_name, password_hash, role, \
     household_id, created_at, updated_at, last_login_at";

impl Member {
    /// Inserts a member
    ///
    /// # Errors
    ///
    /// A duplicate email violates `members_email_key`.
    pub async fn create(pool: &PgPool, data: CreateMember) -> Result<Self, sqlx::Error> {
        Self::create_with(pool, data).await
    }

    /// Inserts a member on an existing connection or transaction
    pub async fn create_with<'e, E>(executor: E, data: CreateMember) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let query = format!(
            "INSERT INTO members (email, username, display_name, password_hash, role, household_id)
             VALUES ($1, $1, $2, $3, $4, $5)
             RETURNING {MEMBER_COLUMNS}"
        );

        sqlx::query_as::<_, Member>(&query)
            .bind(data.email)
            .bind(data.display_name)
            .bind(data.password_hash)
            .bind(data.role)
            .bind(data.household_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1");

        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup (CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE email = $1::citext");

        sqlx::query_as::<_, Member>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn email_exists<'e, E>(executor: E, email: &str) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM members WHERE email = $1::citext)")
            .bind(email)
            .fetch_one(executor)
            .await
    }

    /// Members of a household ordered by display name
    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM members
             WHERE household_id = $1
             ORDER BY display_name, email"
        );

        sqlx::query_as::<_, Member>(&query)
            .bind(household_id)
            .fetch_all(pool)
            .await
    }

    /// Changes a member's role
    ///
    /// # Returns
    ///
    /// The updated member, None if it doesn't exist
    pub async fn update_role(
        pool: &PgPool,
        id: Uuid,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE members SET role = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {MEMBER_COLUMNS}"
        );

        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .bind(role)
            .fetch_optional(pool)
            .await
    }

    /// Attaches a member to a household (or detaches it with `None`)
    pub async fn set_household<'e, E>(
        executor: E,
        id: Uuid,
        household_id: Option<Uuid>,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE members SET household_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(household_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Called after a successful login
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE members SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permanently deletes a member account
    ///
    /// Task assignments are removed with it; tasks, invitations and expenses
    /// that reference the member keep existing with the reference cleared.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
