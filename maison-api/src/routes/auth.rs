/// Authentication endpoints
///
/// - `GET /accounts/login`, `POST /accounts/login`: credential form
/// - `POST /logout`: end the session (authenticated)
/// - `GET /inscription`, `POST /inscription`: self-service signup
///
/// A successful login or signup sets the `maison_session` cookie (HS256 JWT
/// naming the member) and redirects into the application. Logout revokes the
/// token server-side, so a copy of the cookie stops working too.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use maison_shared::{
    auth::{
        password::{self, MIN_PASSWORD_LENGTH},
        session::{create_token, SessionClaims, SESSION_COOKIE},
    },
    invitation::store::MEMBER_EMAIL_CONSTRAINT,
    models::{
        household::{CreateHousehold, Household, MAX_NAME_LENGTH},
        member::{CreateMember, Member, Role},
        revoked_session::RevokedSession,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{form::empty_as_none, views};
use crate::{
    app::AppState,
    cookies,
    error::{ApiError, ApiResult, OrRedirect, Rejected},
    extract::{safe_next, CurrentMember, ValidForm},
    flash::{self, Flash, IncomingFlash, Page},
};

/// Cookie jar carrying a fresh session for `member_id`
pub(crate) fn start_session(state: &AppState, member_id: Uuid) -> ApiResult<CookieJar> {
    let ttl = state.config.session_ttl();
    let token = create_token(&SessionClaims::with_ttl(member_id, ttl), state.session_secret())?;

    let cookie = cookies::build(
        SESSION_COOKIE,
        token,
        time::Duration::seconds(ttl.num_seconds()),
        state.config.api.production,
    );

    Ok(CookieJar::new().add(cookie))
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub next: Option<String>,
}

pub async fn login_page(flash: IncomingFlash, Query(query): Query<LoginQuery>) -> Page<LoginView> {
    Page::new(flash, LoginView { next: query.next })
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Checks credentials and opens a session
///
/// Unknown email and wrong password get the same message.
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Form(form), _): ValidForm<LoginForm, views::Login>,
) -> Result<Response, Rejected> {
    let invalid = || ApiError::Validation("Invalid email or password".to_string()).at(views::LOGIN);

    let member = Member::find_by_email(&state.db, form.email.trim())
        .await
        .or_redirect(views::LOGIN)?;

    let Some(member) = member else {
        warn!("Login with unknown email");
        return Err(invalid());
    };

    if !password::verify_password(&form.password, &member.password_hash).or_redirect(views::LOGIN)? {
        warn!(member_id = %member.id, "Login with wrong password");
        return Err(invalid());
    }

    Member::update_last_login(&state.db, member.id)
        .await
        .or_redirect(views::LOGIN)?;

    info!(member_id = %member.id, "Member logged in");

    let session = start_session(&state, member.id).or_redirect(views::LOGIN)?;

    let to = safe_next(form.next.as_deref(), views::TASKS);
    let response = flash::redirect(to, Flash::success(format!("Welcome back, {}", member.display_name)));

    Ok((session, response).into_response())
}

/// Ends the session and clears its cookie
pub async fn logout(
    State(state): State<AppState>,
    member: CurrentMember,
) -> Result<Response, Rejected> {
    RevokedSession::revoke(&state.db, &member.session)
        .await
        .or_redirect(views::TASKS)?;

    info!(member_id = %member.id, jti = %member.session.jti, "Member logged out");

    let jar = CookieJar::new().add(cookies::expired(SESSION_COOKIE));
    let response = flash::redirect(views::TASKS, Flash::info("You have been logged out"));

    Ok((jar, response).into_response())
}

#[derive(Debug, Serialize)]
pub struct SignupView {
    pub min_password_length: usize,
}

pub async fn signup_page(flash: IncomingFlash) -> Page<SignupView> {
    Page::new(
        flash,
        SignupView {
            min_password_length: MIN_PASSWORD_LENGTH,
        },
    )
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupForm {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub display_name: String,

    pub password: String,

    pub password_confirmation: String,

    /// Creates a household the new member administers
    #[serde(default, deserialize_with = "empty_as_none")]
    pub household_name: Option<String>,
}

/// Creates an account
///
/// With a household name, the household is created too and the new member
/// becomes its admin; both rows are written in one transaction.
pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Form(mut form), _): ValidForm<SignupForm, views::Signup>,
) -> Result<Response, Rejected> {
    form.email = form.email.trim().to_string();
    form.display_name = form.display_name.trim().to_string();

    form.validate().or_redirect(views::SIGNUP)?;

    if form.password != form.password_confirmation {
        return Err(ApiError::Validation("Passwords do not match".to_string()).at(views::SIGNUP));
    }

    password::validate_password_strength(&form.password)
        .map_err(ApiError::Validation)
        .or_redirect(views::SIGNUP)?;

    let household_name = form
        .household_name
        .as_deref()
        .map(|name| super::form::required_text(name, "Household name", MAX_NAME_LENGTH))
        .transpose()
        .or_redirect(views::SIGNUP)?;

    if Member::email_exists(&state.db, &form.email)
        .await
        .or_redirect(views::SIGNUP)?
    {
        return Err(ApiError::EmailAlreadyInUse.at(views::SIGNUP));
    }

    let password_hash = password::hash_password(&form.password).or_redirect(views::SIGNUP)?;

    let mut tx = state.db.begin().await.or_redirect(views::SIGNUP)?;

    let household = match household_name {
        Some(name) => Some(
            Household::create_with(&mut *tx, CreateHousehold { name, room_count: None })
                .await
                .or_redirect(views::SIGNUP)?,
        ),
        None => None,
    };

    let member = Member::create_with(
        &mut *tx,
        CreateMember {
            email: form.email,
            display_name: form.display_name,
            password_hash,
            role: if household.is_some() { Role::Admin } else { Role::Member },
            household_id: household.as_ref().map(|h| h.id),
        },
    )
    .await
    .map_err(|e| {
        let taken = matches!(&e, sqlx::Error::Database(db_err)
            if db_err.constraint() == Some(MEMBER_EMAIL_CONSTRAINT));
        if taken {
            ApiError::EmailAlreadyInUse
        } else {
            ApiError::from(e)
        }
    })
    .or_redirect(views::SIGNUP)?;

    tx.commit().await.or_redirect(views::SIGNUP)?;

    info!(
        member_id = %member.id,
        household_id = ?member.household_id,
        role = %member.role,
        "Member signed up"
    );

    let session = start_session(&state, member.id).or_redirect(views::SIGNUP)?;
    let response = flash::redirect(
        views::TASKS,
        Flash::success(format!("Welcome, {}", member.display_name)),
    );

    Ok((session, response).into_response())
}
