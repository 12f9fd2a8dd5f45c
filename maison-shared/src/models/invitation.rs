/// Invitation model and database operations
///
/// An invitation is a bearer code that lets a new person join a household
/// with a given role. It is redeemable once, and only within
/// [`VALIDITY_DAYS`] days of its creation.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     code VARCHAR(64) NOT NULL UNIQUE,
///     household_id UUID NOT NULL REFERENCES households(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'member',
///     created_by UUID REFERENCES members(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     used BOOLEAN NOT NULL DEFAULT FALSE,
///     used_at TIMESTAMPTZ,
///     used_by UUID REFERENCES members(id) ON DELETE SET NULL
/// );
/// ```
///
/// # Lifecycle
///
/// ```text
/// created ──(redeem within 7 days)──► redeemed
///    │
///    └──(7 days elapse)──► expired
/// ```
///
/// Validity is derived, never stored: it is recomputed from `used` and
/// `created_at` on every redemption attempt.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::member::Role;

/// Number of days an invitation stays redeemable
pub const VALIDITY_DAYS: i64 = 7;

/// Lifetime of an invitation
pub fn validity() -> Duration {
    Duration::days(VALIDITY_DAYS)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,

    /// Unique random code handed to the invitee
    pub code: String,

    pub household_id: Uuid,

    /// Role granted on redemption
    pub role: Role,

    /// Issuing admin, cleared if that account is deleted
    pub created_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<Uuid>,
}

/// Input for storing a freshly issued invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitation {
    pub code: String,
    pub household_id: Uuid,
    pub role: Role,
    pub created_by: Uuid,
}

impl Invitation {
    /// Whether the invitation can still be redeemed at `now`
    ///
    /// True when unused and at most [`VALIDITY_DAYS`] old. An invitation
    /// dated in the future (clock skew between app servers) is treated as
    /// fresh.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && now - self.created_at <= validity()
    }

    /// Instant after which the invitation can no longer be redeemed
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + validity()
    }

    /// Inserts an invitation
    ///
    /// # Errors
    ///
    /// A code collision violates `invitations_code_key`; a missing household
    /// violates the foreign key.
    pub async fn create(pool: &PgPool, data: CreateInvitation) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (code, household_id, role, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, household_id, role, created_by, created_at,
                      used, used_at, used_by
            "#,
        )
        .bind(data.code)
        .bind(data.household_id)
        .bind(data.role)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    /// Finds an unused invitation by code and locks its row
    ///
    /// Must run inside a transaction; a concurrent redemption of the same
    /// code waits on the lock and then sees `used = true`.
    pub async fn lock_unused_by_code<'e, E>(
        executor: E,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, code, household_id, role, created_by, created_at,
                   used, used_at, used_by
            FROM invitations
            WHERE code = $1 AND used = FALSE
            FOR UPDATE
            "#,
        )
        .bind(code)
        .fetch_optional(executor)
        .await
    }

    /// Transitions an invitation to redeemed
    ///
    /// The update only matches while the invitation is unused and not older
    /// than `issued_after`.
    ///
    /// # Returns
    ///
    /// False when nothing matched (already redeemed or expired)
    pub async fn mark_used<'e, E>(
        executor: E,
        id: Uuid,
        member_id: Uuid,
        now: DateTime<Utc>,
        issued_after: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET used = TRUE,
                used_at = $3,
                used_by = $2
            WHERE id = $1 AND used = FALSE AND created_at >= $4
            "#,
        )
        .bind(id)
        .bind(member_id)
        .bind(now)
        .bind(issued_after)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, code, household_id, role, created_by, created_at,
                   used, used_at, used_by
            FROM invitations
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// Invitations issued for a household, newest first
    pub async fn list_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, code, household_id, role, created_by, created_at,
                   used, used_at, used_by
            FROM invitations
            WHERE household_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(household_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation(created_at: DateTime<Utc>, used: bool) -> Invitation {
        Invitation {
            id: Uuid::new_v4(),
            code: "abc".to_string(),
            household_id: Uuid::new_v4(),
            role: Role::Member,
            created_by: None,
            created_at,
            used,
            used_at: None,
            used_by: None,
        }
    }

    #[test]
    fn test_fresh_unused_invitation_is_valid() {
        let now = Utc::now();
        assert!(invitation(now, false).is_valid_at(now));
        assert!(invitation(now - Duration::days(6), false).is_valid_at(now));
    }

    #[test]
    fn test_validity_boundary_is_inclusive() {
        let now = Utc::now();
        assert!(invitation(now - Duration::days(7), false).is_valid_at(now));
        assert!(!invitation(now - Duration::days(7) - Duration::seconds(1), false).is_valid_at(now));
    }

    #[test]
    fn test_eight_day_old_invitation_is_expired() {
        let now = Utc::now();
        assert!(!invitation(now - Duration::days(8), false).is_valid_at(now));
    }

    #[test]
    fn test_used_invitation_is_never_valid() {
        let now = Utc::now();
        assert!(!invitation(now, true).is_valid_at(now));
    }

    #[test]
    fn test_expires_at() {
        let now = Utc::now();
        assert_eq!(invitation(now, false).expires_at(), now + Duration::days(7));
    }
}
