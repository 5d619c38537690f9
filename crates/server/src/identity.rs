//! # Anonymous Identity
//!
//! Users are identified by a long-lived `user_id` cookie. The
//! [`assign_user_id`] middleware issues one when the request carries none and
//! exposes the id to handlers, and the [`CurrentUser`] extractor registers
//! that id in the store before a handler touches any user-scoped data.

use crate::{errors::AppError, state::AppState};
use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, info};
use uuid::Uuid;

pub const USER_COOKIE: &str = "user_id";
const COOKIE_MAX_AGE_DAYS: i64 = 365;

/// The id carried by the request, inserted into extensions by [`assign_user_id`].
#[derive(Debug, Clone)]
pub struct UserId(pub String);

fn new_user_id() -> String {
    format!("user_{}", Uuid::new_v4())
}

fn user_cookie(user_id: String) -> Cookie<'static> {
    Cookie::build((USER_COOKIE, user_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(COOKIE_MAX_AGE_DAYS))
        .build()
}

/// Reads the `user_id` cookie, issuing a fresh one when it is absent or empty.
pub async fn assign_user_id(jar: CookieJar, mut request: Request, next: Next) -> (CookieJar, Response) {
    let existing = jar
        .get(USER_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    let (jar, user_id) = match existing {
        Some(user_id) => (jar, user_id),
        None => {
            let user_id = new_user_id();
            info!(user_id = %user_id, "Issued new user id.");
            (jar.add(user_cookie(user_id.clone())), user_id)
        }
    };

    request.extensions_mut().insert(UserId(user_id));
    (jar, next.run(request).await)
}

/// The user behind the current request, already registered in the store.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let UserId(user_id) = parts.extensions.get::<UserId>().cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("identity middleware is not installed"))
        })?;
        state.sqlite_provider.touch_user(&user_id).await?;
        debug!(user_id = %user_id, "Resolved current user.");
        Ok(CurrentUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_cookie_attributes() {
        let cookie = user_cookie("user_abc".to_string());
        assert_eq!(cookie.name(), USER_COOKIE);
        assert_eq!(cookie.value(), "user_abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(365)));
    }

    #[test]
    fn test_new_user_id_format() {
        let id = new_user_id();
        assert!(id.starts_with("user_"));
        assert!(Uuid::parse_str(id.trim_start_matches("user_")).is_ok());
        assert_ne!(id, new_user_id());
    }
}
