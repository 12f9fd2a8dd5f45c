/// Error handling for the API server
///
/// Handlers work with [`ApiError`]. Every expected failure (permission,
/// validation, invitation state) is recovered at the request boundary: the
/// browser is sent back to a safe view with the message as a flash. Only
/// storage and hashing failures end the request with a 500.
///
/// A handler picks its fallback view with [`OrRedirect::or_redirect`] or
/// [`ApiError::at`]:
///
/// ```
/// use maison_api::error::{ApiError, OrRedirect, Rejected};
/// use maison_api::routes::views;
///
/// fn parse_count(raw: &str) -> Result<u32, Rejected> {
///     raw.parse::<u32>()
///         .map_err(|_| ApiError::Validation("Room count must be a number".to_string()))
///         .or_redirect(views::HOUSEHOLDS)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use maison_shared::auth::{authorization::AuthzError, password::PasswordError, session::SessionError};
use maison_shared::invitation::InvitationError;
use serde::{Deserialize, Serialize};

use crate::flash::{self, Flash};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Role or household scope forbids the action
    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    /// Form input rejected
    #[error("{0}")]
    Validation(String),

    #[error("Invalid invitation code")]
    InvalidCode,

    #[error("This invitation has expired or was already used")]
    ExpiredOrUsed,

    #[error("An account with this email already exists")]
    EmailAlreadyInUse,

    /// Storage or hashing failure; details are logged, never shown
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Sends the browser to `view` on failure
    pub fn at(self, view: &'static str) -> Rejected {
        Rejected { error: self, view }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::PermissionDenied(_) => "permission_denied",
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::InvalidCode => "invalid_code",
            ApiError::ExpiredOrUsed => "expired_or_used",
            ApiError::EmailAlreadyInUse => "email_already_in_use",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

/// Body of a 500 response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// An [`ApiError`] bound to the view the browser falls back to
#[derive(Debug)]
pub struct Rejected {
    pub error: ApiError,
    pub view: &'static str,
}

impl IntoResponse for Rejected {
    fn into_response(self) -> Response {
        match self.error {
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                let body = Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "An internal error occurred".to_string(),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            error => {
                tracing::warn!(
                    error = error.code(),
                    message = %error,
                    redirect_to = self.view,
                    "Request rejected"
                );
                flash::redirect(self.view, Flash::error(error.to_string()))
            }
        }
    }
}

/// Binds any error convertible to [`ApiError`] to a fallback view
pub trait OrRedirect<T> {
    fn or_redirect(self, view: &'static str) -> Result<T, Rejected>;
}

impl<T, E> OrRedirect<T> for Result<T, E>
where
    E: Into<ApiError>,
{
    fn or_redirect(self, view: &'static str) -> Result<T, Rejected> {
        self.map_err(|e| e.into().at(view))
    }
}

/// SQLSTATE `numeric_value_out_of_range`
const NUMERIC_OUT_OF_RANGE: &str = "22003";

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Not found".to_string()),
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) =>
            {
                ApiError::Validation("This amount is too large".to_string())
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::PermissionDenied(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Internal(format!("Session error: {}", err))
    }
}

impl From<InvitationError> for ApiError {
    fn from(err: InvitationError) -> Self {
        match err {
            InvitationError::PermissionDenied(e) => e.into(),
            InvitationError::NotFound => ApiError::NotFound("Household not found".to_string()),
            InvitationError::InvalidCode => ApiError::InvalidCode,
            InvitationError::ExpiredOrUsed => ApiError::ExpiredOrUsed,
            InvitationError::EmailAlreadyInUse => ApiError::EmailAlreadyInUse,
            InvitationError::Validation(msg) => ApiError::Validation(msg),
            InvitationError::CodeCollision => {
                ApiError::Internal("Could not draw an unused invitation code".to_string())
            }
            InvitationError::Password(e) => e.into(),
            InvitationError::Storage(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    /// Keeps the first message; forms show one error at a time
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errors| errors.iter())
            .filter_map(|error| error.message.as_ref().map(|m| m.to_string()))
            .next()
            .unwrap_or_else(|| "Invalid input".to_string());

        ApiError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use maison_shared::models::member::Role;

    #[test]
    fn test_error_display() {
        assert_eq!(ApiError::InvalidCode.to_string(), "Invalid invitation code");
        assert_eq!(
            ApiError::Validation("Passwords do not match".to_string()).to_string(),
            "Passwords do not match"
        );
    }

    #[test]
    fn test_rejection_redirects_with_flash() {
        let response = ApiError::PermissionDenied("No".to_string())
            .at("/foyers")
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/foyers");

        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        let value = cookie
            .strip_prefix("maison_flash=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        let flash = Flash::decode(value).unwrap();
        assert_eq!(flash, Flash::error("No"));
    }

    /// Database error carrying a bare SQLSTATE
    #[derive(Debug)]
    struct Sqlstate(&'static str);

    impl std::fmt::Display for Sqlstate {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "sqlstate {}", self.0)
        }
    }

    impl std::error::Error for Sqlstate {}

    impl sqlx::error::DatabaseError for Sqlstate {
        fn message(&self) -> &str {
            "numeric field overflow"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    #[test]
    fn test_numeric_overflow_is_a_validation_error() {
        let overflow = ApiError::from(sqlx::Error::Database(Box::new(Sqlstate("22003"))));
        assert!(matches!(overflow, ApiError::Validation(ref msg) if msg == "This amount is too large"));

        let response = overflow.at("/budget").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/budget");

        let other = ApiError::from(sqlx::Error::Database(Box::new(Sqlstate("40001"))));
        assert!(matches!(other, ApiError::Internal(_)));
    }

    #[test]
    fn test_internal_error_is_500() {
        let response = ApiError::Internal("pool timed out".to_string())
            .at("/taches")
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_invitation_error_mapping() {
        assert!(matches!(
            ApiError::from(InvitationError::InvalidCode),
            ApiError::InvalidCode
        ));
        assert!(matches!(
            ApiError::from(InvitationError::ExpiredOrUsed),
            ApiError::ExpiredOrUsed
        ));
        assert!(matches!(
            ApiError::from(InvitationError::EmailAlreadyInUse),
            ApiError::EmailAlreadyInUse
        ));
        assert!(matches!(
            ApiError::from(InvitationError::CodeCollision),
            ApiError::Internal(_)
        ));

        let denied = ApiError::from(InvitationError::PermissionDenied(AuthzError::InsufficientRole {
            role: Role::Guest,
            capability: maison_shared::auth::authorization::Capability::ManageHousehold,
        }));
        assert_eq!(denied.to_string(), "The guest role cannot manage the household");
    }

    #[test]
    fn test_sqlx_errors_are_internal() {
        assert!(matches!(
            ApiError::from(sqlx::Error::PoolTimedOut),
            ApiError::Internal(_)
        ));
        assert!(matches!(
            ApiError::from(sqlx::Error::RowNotFound),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_or_redirect() {
        let result: Result<(), AuthzError> = Err(AuthzError::NoHousehold);
        let rejected = result.or_redirect("/taches").unwrap_err();

        assert_eq!(rejected.view, "/taches");
        assert!(matches!(rejected.error, ApiError::PermissionDenied(_)));
    }
}
