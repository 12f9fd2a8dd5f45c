/// Storage seam of the invitation service
///
/// [`InvitationStore`] is the only way the service touches persistent state.
/// [`PgInvitationStore`] runs redemption as one PostgreSQL transaction;
/// [`MemoryInvitationStore`](super::memory::MemoryInvitationStore) keeps
/// everything behind a mutex for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::InvitationError;
use crate::models::household::Household;
use crate::models::invitation::{validity, CreateInvitation, Invitation};
use crate::models::member::{CreateMember, Member};

/// Unique constraint on `members.email`
pub const MEMBER_EMAIL_CONSTRAINT: &str = "members_email_key";

/// Unique constraint on `invitations.code`
pub const INVITATION_CODE_CONSTRAINT: &str = "invitations_code_key";

/// The account to create when a code is redeemed
#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: String,
    pub display_name: String,
    /// Argon2id hash of the chosen password
    pub password_hash: String,
}

/// Outcome of a successful redemption
#[derive(Debug, Clone)]
pub struct Redemption {
    pub member: Member,
    /// The invitation as it was before being marked used
    pub invitation: Invitation,
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    async fn household_exists(&self, household_id: Uuid) -> Result<bool, InvitationError>;

    /// Stores a new invitation
    ///
    /// # Errors
    ///
    /// `InvitationError::CodeCollision` when the code is already taken
    async fn insert(&self, data: CreateInvitation) -> Result<Invitation, InvitationError>;

    /// Looks `code` up without locking or writing anything
    ///
    /// Lets the service turn away a bad code before hashing a password;
    /// [`redeem`](Self::redeem) checks again under lock.
    ///
    /// # Errors
    ///
    /// - `InvalidCode`: no unused invitation has this code
    /// - `ExpiredOrUsed`: the invitation is older than its validity
    async fn find_redeemable(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Invitation, InvitationError>;

    /// Atomically creates the member and marks the invitation used
    ///
    /// Either both writes happen or neither does.
    ///
    /// # Errors
    ///
    /// - `InvalidCode`: no unused invitation has this code
    /// - `ExpiredOrUsed`: the invitation is older than its validity, or was
    ///   redeemed concurrently
    /// - `EmailAlreadyInUse`: an account with this email exists
    async fn redeem(
        &self,
        code: &str,
        member: NewMember,
        now: DateTime<Utc>,
    ) -> Result<Redemption, InvitationError>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgInvitationStore {
    pool: PgPool,
}

impl PgInvitationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique violation on `constraint` to `mapped`, anything else to storage
fn on_unique_violation(err: sqlx::Error, constraint: &str, mapped: InvitationError) -> InvitationError {
    if matches!(&err, sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint)) {
        mapped
    } else {
        InvitationError::Storage(err)
    }
}

#[async_trait]
impl InvitationStore for PgInvitationStore {
    async fn household_exists(&self, household_id: Uuid) -> Result<bool, InvitationError> {
        Ok(Household::exists(&self.pool, household_id).await?)
    }

    async fn insert(&self, data: CreateInvitation) -> Result<Invitation, InvitationError> {
        Invitation::create(&self.pool, data).await.map_err(|e| {
            match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    InvitationError::NotFound
                }
                _ => on_unique_violation(e, INVITATION_CODE_CONSTRAINT, InvitationError::CodeCollision),
            }
        })
    }

    async fn find_redeemable(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Invitation, InvitationError> {
        let invitation = Invitation::find_by_code(&self.pool, code)
            .await?
            .filter(|invitation| !invitation.used)
            .ok_or(InvitationError::InvalidCode)?;

        if !invitation.is_valid_at(now) {
            return Err(InvitationError::ExpiredOrUsed);
        }

        Ok(invitation)
    }

    async fn redeem(
        &self,
        code: &str,
        member: NewMember,
        now: DateTime<Utc>,
    ) -> Result<Redemption, InvitationError> {
        let mut tx = self.pool.begin().await?;

        // Row lock: a concurrent redemption waits here, then finds it used
        let invitation = Invitation::lock_unused_by_code(&mut *tx, code)
            .await?
            .ok_or(InvitationError::InvalidCode)?;

        if !invitation.is_valid_at(now) {
            return Err(InvitationError::ExpiredOrUsed);
        }

        if Member::email_exists(&mut *tx, &member.email).await? {
            return Err(InvitationError::EmailAlreadyInUse);
        }

        let created = Member::create_with(
            &mut *tx,
            CreateMember {
                email: member.email,
                display_name: member.display_name,
                password_hash: member.password_hash,
                role: invitation.role,
                household_id: Some(invitation.household_id),
            },
        )
        .await
        .map_err(|e| on_unique_violation(e, MEMBER_EMAIL_CONSTRAINT, InvitationError::EmailAlreadyInUse))?;

        let marked =
            Invitation::mark_used(&mut *tx, invitation.id, created.id, now, now - validity()).await?;
        if !marked {
            return Err(InvitationError::ExpiredOrUsed);
        }

        tx.commit().await?;

        debug!(invitation_id = %invitation.id, member_id = %created.id, "Invitation redeemed in store");

        Ok(Redemption {
            member: created,
            invitation,
        })
    }
}
