/// One-shot flash messages
///
/// A form post answers with `303 See Other` and leaves a message in the
/// `maison_flash` cookie. The next GET view returns it inside its JSON body
/// and expires the cookie.
///
/// The cookie value is the hex-encoded JSON of [`Flash`].
///
/// # Example
///
/// ```no_run
/// use maison_api::flash::{redirect, Flash, IncomingFlash, Page};
/// use axum::response::Response;
/// use serde::Serialize;
///
/// async fn submit() -> Response {
///     redirect("/taches", Flash::success("Task added"))
/// }
///
/// #[derive(Serialize)]
/// struct Greeting {
///     text: &'static str,
/// }
///
/// async fn show(flash: IncomingFlash) -> Page<Greeting> {
///     Page::new(flash, Greeting { text: "bonjour" })
/// }
/// ```

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use time::Duration;

use crate::cookies;

pub const FLASH_COOKIE: &str = "maison_flash";

/// How long an unread flash survives
const FLASH_MAX_AGE: Duration = Duration::minutes(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    /// Cookie-safe encoding
    pub fn encode(&self) -> String {
        hex::encode(serde_json::to_vec(self).unwrap_or_default())
    }

    /// Inverse of [`Flash::encode`]; None for anything tampered with
    pub fn decode(value: &str) -> Option<Self> {
        let bytes = hex::decode(value).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// `303 See Other` to `to`, carrying `flash`
pub fn redirect(to: &str, flash: Flash) -> Response {
    let jar = CookieJar::new().add(cookies::build(FLASH_COOKIE, flash.encode(), FLASH_MAX_AGE, false));

    (jar, Redirect::to(to)).into_response()
}

/// Flash left by the previous response, if any
#[derive(Debug, Clone, Default)]
pub struct IncomingFlash(pub Option<Flash>);

#[async_trait]
impl<S> FromRequestParts<S> for IncomingFlash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        Ok(Self(jar.get(FLASH_COOKIE).and_then(|cookie| Flash::decode(cookie.value()))))
    }
}

/// JSON view model plus the pending flash
///
/// Rendering a page consumes the flash.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub flash: Option<Flash>,

    #[serde(flatten)]
    pub view: T,
}

impl<T> Page<T> {
    pub fn new(incoming: IncomingFlash, view: T) -> Self {
        Self {
            flash: incoming.0,
            view,
        }
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        if self.flash.is_none() {
            return Json(self).into_response();
        }

        let jar = CookieJar::new().add(cookies::expired(FLASH_COOKIE));
        (jar, Json(self)).into_response()
    }
}
