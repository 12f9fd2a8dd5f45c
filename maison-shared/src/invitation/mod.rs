/// Household invitations
///
/// A household admin issues a single-use code scoped to their household and a
/// role. Whoever holds the code can, within seven days, create an account that
/// joins the household with that role.
///
/// # Modules
///
/// - [`code`]: Random code generation and shape checks
/// - [`store`]: The [`InvitationStore`] seam and its PostgreSQL implementation
/// - [`memory`]: In-memory store
///
/// # Guarantees
///
/// - Only an admin attached to the target household can issue a code
/// - A code is redeemed at most once, even under concurrent attempts
/// - A code older than seven days is never redeemed
/// - A failed redemption leaves the invitation untouched and creates no account
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use maison_shared::invitation::{InvitationService, RedeemRequest};
/// use maison_shared::invitation::store::PgInvitationStore;
/// # use maison_shared::models::member::Member;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, admin: Member) -> Result<(), Box<dyn std::error::Error>> {
/// let service = InvitationService::new(Arc::new(PgInvitationStore::new(pool)));
///
/// let household_id = admin.household_id.unwrap_or_default();
/// let invitation = service.issue(&admin, household_id, None).await?;
///
/// let member = service.redeem(RedeemRequest {
///     code: invitation.code,
///     display_name: "Camille".to_string(),
///     email: "camille@example.com".to_string(),
///     password: "terrasse42".to_string(),
///     password_confirmation: "terrasse42".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod code;
pub mod memory;
pub mod store;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization::{require_admin, require_same_household, AuthzError};
use crate::auth::password::{hash_password, validate_password_strength, PasswordError};
use crate::models::invitation::{CreateInvitation, Invitation};
use crate::models::member::{Member, Role};
use store::{InvitationStore, NewMember};

/// Attempts at drawing an unused code before giving up
const MAX_CODE_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum InvitationError {
    /// The acting member may not issue invitations for this household
    #[error("{0}")]
    PermissionDenied(#[from] AuthzError),

    #[error("Household not found")]
    NotFound,

    /// No unused invitation has this code
    #[error("Invalid invitation code")]
    InvalidCode,

    #[error("This invitation has expired or was already used")]
    ExpiredOrUsed,

    #[error("An account with this email already exists")]
    EmailAlreadyInUse,

    /// Form input rejected before any lookup
    #[error("{0}")]
    Validation(String),

    /// Generated code already taken; retried internally
    #[error("Invitation code collision")]
    CodeCollision,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Form submitted to join a household
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RedeemRequest {
    pub code: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub display_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    pub password_confirmation: String,
}

impl RedeemRequest {
    fn normalized(mut self) -> Self {
        self.code = self.code.trim().to_string();
        self.display_name = self.display_name.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }

    /// Checks the form fields; does not look at the code
    pub fn check(&self) -> Result<(), InvitationError> {
        self.validate().map_err(|e| {
            let message = e
                .field_errors()
                .values()
                .flat_map(|errors| errors.iter())
                .filter_map(|error| error.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| "Invalid input".to_string());
            InvitationError::Validation(message)
        })?;

        if self.password != self.password_confirmation {
            return Err(InvitationError::Validation("Passwords do not match".to_string()));
        }

        validate_password_strength(&self.password).map_err(InvitationError::Validation)
    }
}

/// Issues and redeems invitations
#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn InvitationStore>,
}

impl InvitationService {
    pub fn new(store: Arc<dyn InvitationStore>) -> Self {
        Self { store }
    }

    /// Issues an invitation to `household_id`
    ///
    /// `role` defaults to [`Role::Member`].
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` if `acting` is not an admin or not attached to
    ///   `household_id`
    /// - `NotFound` if the household doesn't exist
    ///
    /// Nothing is stored on failure.
    pub async fn issue(
        &self,
        acting: &Member,
        household_id: Uuid,
        role: Option<Role>,
    ) -> Result<Invitation, InvitationError> {
        if let Err(denied) = require_admin(acting)
            .and_then(|_| require_same_household(acting, Some(household_id)))
        {
            warn!(
                member_id = %acting.id,
                household_id = %household_id,
                reason = %denied,
                "Invitation issue denied"
            );
            return Err(denied.into());
        }

        if !self.store.household_exists(household_id).await? {
            return Err(InvitationError::NotFound);
        }

        let role = role.unwrap_or_default();

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let data = CreateInvitation {
                code: code::generate_code(),
                household_id,
                role,
                created_by: acting.id,
            };

            match self.store.insert(data).await {
                Ok(invitation) => {
                    info!(
                        invitation_id = %invitation.id,
                        household_id = %household_id,
                        role = %role,
                        issued_by = %acting.id,
                        "Invitation issued"
                    );
                    return Ok(invitation);
                }
                Err(InvitationError::CodeCollision) => {
                    warn!(attempt, "Invitation code collision, drawing a new code");
                }
                Err(e) => return Err(e),
            }
        }

        Err(InvitationError::CodeCollision)
    }

    /// Redeems a code and creates the new member
    pub async fn redeem(&self, request: RedeemRequest) -> Result<Member, InvitationError> {
        self.redeem_at(request, Utc::now()).await
    }

    /// Redeems a code as of `now`
    ///
    /// # Errors
    ///
    /// - `Validation` for rejected form input
    /// - `InvalidCode` for a malformed, unknown or already used code
    /// - `ExpiredOrUsed` for a code past its validity, or one redeemed
    ///   concurrently
    /// - `EmailAlreadyInUse` if an account with this email exists
    pub async fn redeem_at(
        &self,
        request: RedeemRequest,
        now: DateTime<Utc>,
    ) -> Result<Member, InvitationError> {
        let request = request.normalized();
        request.check()?;

        if !code::is_well_formed(&request.code) {
            return Err(InvitationError::InvalidCode);
        }

        // Hashing is the expensive step; a dead code never reaches it
        self.store.find_redeemable(&request.code, now).await?;

        let new_member = NewMember {
            email: request.email,
            display_name: request.display_name,
            password_hash: hash_password(&request.password)?,
        };

        let redemption = self.store.redeem(&request.code, new_member, now).await?;

        info!(
            invitation_id = %redemption.invitation.id,
            household_id = %redemption.invitation.household_id,
            member_id = %redemption.member.id,
            role = %redemption.member.role,
            "Invitation redeemed"
        );

        Ok(redemption.member)
    }
}
