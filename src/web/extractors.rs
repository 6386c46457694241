use crate::models::Account;
use crate::services::accounts;
use crate::web::error::json_error;
use crate::web::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Response;
use axum_extra::extract::CookieJar;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "session";

/// The signed-in account. Rejects with 401 when the session cookie is
/// missing, expired, or belongs to a deactivated account.
pub struct CurrentUser(pub Account);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Response;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        let headers = parts.headers.clone();
        Box::pin(async move {
            let cookies = CookieJar::from_headers(&headers);
            let token = cookies
                .get(SESSION_COOKIE)
                .map(|c| c.value().to_string())
                .ok_or_else(|| json_error(StatusCode::UNAUTHORIZED, "Login required"))?;

            let account = accounts::validate_session(&state.db, &token)
                .map_err(|e| {
                    tracing::error!("Session lookup failed: {}", e);
                    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                })?
                .ok_or_else(|| json_error(StatusCode::UNAUTHORIZED, "Login required"))?;

            Ok(CurrentUser(account))
        })
    }
}

pub struct OptionalUser(pub Option<Account>);

impl FromRequestParts<Arc<AppState>> for OptionalUser {
    type Rejection = StatusCode;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        let headers = parts.headers.clone();
        Box::pin(async move {
            let cookies = CookieJar::from_headers(&headers);
            let token = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());

            let account = match token {
                Some(t) => accounts::validate_session(&state.db, &t).ok().flatten(),
                None => None,
            };

            Ok(OptionalUser(account))
        })
    }
}
