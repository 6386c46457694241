use super::json_single;
use crate::models::{Account, Registration};
use crate::services::accounts;
use crate::services::error::ServiceError;
use crate::web::error::{json_error, AppResult};
use crate::web::extractors::SESSION_COOKIE;
use crate::web::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::sync::Arc;
use time::Duration;

fn session_cookie(token: String, days: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .max_age(Duration::days(days))
        .build()
}

fn open_session(state: &AppState, jar: CookieJar, account: &Account) -> AppResult<CookieJar> {
    let days = state.config.auth.session_lifetime_days;
    let token = accounts::create_session(&state.db, account.id, days)?;
    Ok(jar.add(session_cookie(token, days)))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(input): Json<Registration>,
) -> AppResult<Response> {
    let id = accounts::register(&state.db, input)?;
    let account = accounts::get_account(&state.db, id)?
        .ok_or(ServiceError::NotFound("Account"))?;
    let jar = open_session(&state, jar, &account)?;

    Ok((StatusCode::CREATED, jar, json_single(&account)).into_response())
}

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<LoginRequest>,
) -> AppResult<Response> {
    let rate_key = form.username.trim().to_lowercase();
    if !state.rate_limiter.check(&rate_key) {
        tracing::warn!("Login rate limit reached for {}", rate_key);
        return Ok(json_error(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many login attempts, try again later",
        ));
    }

    let account = match accounts::authenticate(&state.db, form.username.trim(), &form.password) {
        Ok(account) => account,
        Err(e) => {
            state.rate_limiter.record_attempt(&rate_key);
            return Err(e.into());
        }
    };
    state.rate_limiter.clear(&rate_key);

    let jar = open_session(&state, jar, &account)?;
    Ok((jar, json_single(&account)).into_response())
}

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = accounts::delete_session(&state.db, cookie.value()) {
            tracing::warn!("Failed to delete session on logout: {}", e);
        }
    }

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build();

    Ok((jar.remove(cookie), StatusCode::NO_CONTENT).into_response())
}
