/// Cookies set by the server
///
/// Only two exist: the session and the flash. Both are `HttpOnly`,
/// `SameSite=Lax` and scoped to `/`; they travel in an
/// [`axum_extra` `CookieJar`](axum_extra::extract::cookie::CookieJar).

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie living `max_age`, `Secure` when `secure`
pub fn build(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .secure(secure)
        .build()
}

/// Cookie overwriting `name` with an empty value that expires at once
pub fn expired(name: &'static str) -> Cookie<'static> {
    build(name, String::new(), Duration::ZERO, false)
}
