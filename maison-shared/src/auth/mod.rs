/// Authentication and authorization
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`session`]: Signed session tokens carried in the session cookie
/// - [`authorization`]: The access gate every mutating operation goes through
///
/// # Example
///
/// ```no_run
/// use maison_shared::auth::password::{hash_password, verify_password};
/// use maison_shared::auth::session::{create_token, validate_token, SessionClaims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("motdepasse1")?;
/// assert!(verify_password("motdepasse1", &hash)?);
///
/// let secret = "a-session-secret-of-at-least-32-bytes";
/// let token = create_token(&SessionClaims::new(Uuid::new_v4()), secret)?;
/// let claims = validate_token(&token, secret)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod password;
pub mod session;
