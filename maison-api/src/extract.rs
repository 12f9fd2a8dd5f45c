/// Request extractors
///
/// [`CurrentMember`] resolves the session cookie to a live member account.
/// Handlers that take it are authenticated; anything else is public.
///
/// [`ValidForm`] and [`ValidPath`] wrap axum's `Form` and `Path`: input that
/// fails to parse is answered like any other validation error, with a flash
/// and a redirect to the view named by the second type parameter.

use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{FormRejection, PathRejection},
        FromRequestParts, Path,
    },
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use maison_shared::auth::session::{validate_token, SessionClaims, SESSION_COOKIE};
use maison_shared::models::{member::Member, revoked_session::RevokedSession};
use std::{marker::PhantomData, ops::Deref};
use tracing::debug;

use crate::{
    app::AppState,
    error::ApiError,
    routes::views::{self, View},
};

/// The authenticated member, reloaded from the database on every request
#[derive(Debug, Clone)]
pub struct CurrentMember {
    pub member: Member,
    /// Claims of the session cookie that authenticated the request
    pub session: SessionClaims,
}

impl Deref for CurrentMember {
    type Target = Member;

    fn deref(&self) -> &Member {
        &self.member
    }
}

/// Redirect to the login page, coming back to `parts`' path afterwards
fn login_redirect(parts: &Parts) -> Response {
    let next = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Redirect::to(&format!("{}?next={}", views::LOGIN, urlencoding::encode(next))).into_response()
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentMember {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Err(login_redirect(parts));
        };

        let session = match validate_token(cookie.value(), state.session_secret()) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Rejected session cookie");
                return Err(login_redirect(parts));
            }
        };

        let member = match RevokedSession::is_revoked(&state.db, session.jti).await {
            Ok(true) => {
                debug!(jti = %session.jti, "Session was logged out");
                Ok(None)
            }
            Ok(false) => Member::find_by_id(&state.db, session.sub).await,
            Err(e) => Err(e),
        };

        match member {
            Ok(Some(member)) => Ok(Self { member, session }),
            Ok(None) => {
                debug!(member_id = %session.sub, "No live member behind the session");
                Err(login_redirect(parts))
            }
            Err(e) => Err(ApiError::from(e).at(views::LOGIN).into_response()),
        }
    }
}

/// Form or path input that could not be parsed, bound to the view `V`
#[derive(Debug)]
pub struct BadInput<V> {
    message: &'static str,
    detail: String,
    view: PhantomData<V>,
}

impl<V> From<FormRejection> for BadInput<V> {
    fn from(rejection: FormRejection) -> Self {
        Self {
            message: "Some fields are missing or invalid",
            detail: rejection.body_text(),
            view: PhantomData,
        }
    }
}

impl<V> From<PathRejection> for BadInput<V> {
    fn from(rejection: PathRejection) -> Self {
        Self {
            message: "This link is not valid",
            detail: rejection.body_text(),
            view: PhantomData,
        }
    }
}

impl<V: View> IntoResponse for BadInput<V> {
    fn into_response(self) -> Response {
        debug!(detail = %self.detail, "Unparseable request input");
        ApiError::Validation(self.message.to_string())
            .at(V::PATH)
            .into_response()
    }
}

/// `Form<T>` falling back to the view `V` when the body doesn't parse
pub type ValidForm<T, V> = WithRejection<Form<T>, BadInput<V>>;

/// `Path<T>` falling back to the view `V` when the path doesn't parse
pub type ValidPath<T, V> = WithRejection<Path<T>, BadInput<V>>;

/// Returns `next` if it is a path on this site, else `fallback`
///
/// Rejects absolute URLs, protocol-relative `//host` and backslash tricks.
pub fn safe_next<'a>(next: Option<&'a str>, fallback: &'a str) -> &'a str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/foyers"), "/taches"), "/foyers");
        assert_eq!(safe_next(Some("/foyer/1?tab=rooms"), "/taches"), "/foyer/1?tab=rooms");
        assert_eq!(safe_next(None, "/taches"), "/taches");
        assert_eq!(safe_next(Some("https://evil.example"), "/taches"), "/taches");
        assert_eq!(safe_next(Some("//evil.example"), "/taches"), "/taches");
        assert_eq!(safe_next(Some("/\\evil.example"), "/taches"), "/taches");
        assert_eq!(safe_next(Some(""), "/taches"), "/taches");
    }

    #[test]
    fn test_login_redirect_keeps_path() {
        let (parts, _) = axum::http::Request::builder()
            .uri("/foyer/abc?x=1")
            .body(())
            .unwrap()
            .into_parts();

        let response = login_redirect(&parts);
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();

        assert_eq!(location, "/accounts/login?next=%2Ffoyer%2Fabc%3Fx%3D1");
    }

    #[tokio::test]
    async fn test_unparseable_form_redirects_to_its_view() {
        use axum::{body::Body, extract::FromRequest, http::header};
        use serde::Deserialize;

        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Pair {
            left: String,
            right: String,
        }

        let request = axum::http::Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("left=a"))
            .unwrap();

        let response = match <ValidForm<Pair, views::Join> as FromRequest<()>>::from_request(request, &()).await {
            Ok(_) => panic!("a form without `right` should be rejected"),
            Err(rejection) => rejection.into_response(),
        };

        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), views::JOIN);
    }

    #[tokio::test]
    async fn test_unparseable_path_redirects_to_its_view() {
        use axum::{extract::Path, routing::get, Router};
        use tower::ServiceExt;

        async fn show(
            WithRejection(Path(id), _): ValidPath<uuid::Uuid, views::Tasks>,
        ) -> String {
            id.to_string()
        }

        let app = Router::new().route("/tache/:id", get(show));
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/tache/not-a-uuid")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(axum::http::header::LOCATION).unwrap(),
            views::TASKS
        );
    }
}
