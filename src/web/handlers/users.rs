use super::json_single;
use crate::models::{PostSummary, ProfileUpdate};
use crate::services::error::ServiceError;
use crate::services::{accounts, posts, statistics};
use crate::web::error::AppResult;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;
use axum::extract::{Path, State};
use axum::response::Json;
use std::sync::Arc;

pub async fn me(CurrentUser(account): CurrentUser) -> Json<serde_json::Value> {
    json_single(&account)
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Json(input): Json<ProfileUpdate>,
) -> AppResult<Json<serde_json::Value>> {
    accounts::update_profile(&state.db, account.id, input)?;
    let account = accounts::get_account(&state.db, account.id)?
        .ok_or(ServiceError::NotFound("Account"))?;
    Ok(json_single(&account))
}

/// Drafts included.
pub async fn my_posts(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
) -> AppResult<Json<serde_json::Value>> {
    let posts = posts::list_by_author(&state.db, account.id, false, None)?;
    Ok(json_single(&posts))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let account = accounts::get_account_by_username(&state.db, &username)?
        .filter(|a| a.is_active)
        .ok_or(ServiceError::NotFound("User"))?;

    let published = posts::list_by_author(&state.db, account.id, true, None)?;
    let total_views = statistics::total_views(&published);
    let recent: Vec<PostSummary> = published
        .iter()
        .take(state.config.content.profile_posts)
        .map(PostSummary::from)
        .collect();

    Ok(json_single(serde_json::json!({
        "account": account,
        "posts": recent,
        "post_count": published.len(),
        "total_views": total_views,
    })))
}
