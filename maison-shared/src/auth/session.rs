/// Session tokens
///
/// A logged-in browser holds one HS256-signed JWT in the `maison_session`
/// cookie. The token only names the member; role and household are reloaded
/// from the database on every request so a role change or a deletion takes
/// effect immediately. Logging out records the token's `jti` in
/// [`RevokedSession`](crate::models::revoked_session::RevokedSession), which
/// ends the session even for a copy of the cookie.
///
/// # Claims
///
/// - `sub`: member id
/// - `jti`: session id, unique per login
/// - `iss`: always `"maison"`
/// - `iat`, `nbf`, `exp`: Unix timestamps
///
/// # Example
///
/// ```
/// use maison_shared::auth::session::{create_token, validate_token, SessionClaims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let member_id = Uuid::new_v4();
/// let secret = "a-session-secret-of-at-least-32-bytes";
///
/// let token = create_token(&SessionClaims::new(member_id), secret)?;
/// assert_eq!(validate_token(&token, secret)?.sub, member_id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into and required from every session token
pub const ISSUER: &str = "maison";

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "maison_session";

/// Default session lifetime in hours
pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to create session token: {0}")]
    Create(String),

    #[error("Session expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Member id
    pub sub: Uuid,
    pub jti: Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
}

impl SessionClaims {
    /// Claims valid for [`DEFAULT_TTL_HOURS`]
    pub fn new(member_id: Uuid) -> Self {
        Self::with_ttl(member_id, Duration::hours(DEFAULT_TTL_HOURS))
    }

    pub fn with_ttl(member_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: member_id,
            jti: Uuid::new_v4(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Seconds until expiry, zero once expired
    pub fn remaining_seconds(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Signs claims with HS256
///
/// # Errors
///
/// Returns `SessionError::Create` if encoding fails
pub fn create_token(claims: &SessionClaims, secret: &str) -> Result<String, SessionError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| SessionError::Create(e.to_string()))
}

/// Verifies signature, issuer, `exp` and `nbf`, and returns the claims
///
/// # Errors
///
/// `SessionError::Expired` for an expired token, `SessionError::Invalid` for
/// anything else (bad signature, wrong issuer, malformed token)
pub fn validate_token(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => SessionError::Expired,
            _ => SessionError::Invalid(e.to_string()),
        })
}
