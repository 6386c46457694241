use super::json_single;
use crate::web::error::AppResult;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;
use axum::extract::State;
use axum::response::Json;
use std::sync::Arc;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
) -> AppResult<Json<serde_json::Value>> {
    let stats = state.statistics.author_dashboard(account.id)?;
    Ok(json_single(&stats))
}

pub async fn global(State(state): State<Arc<AppState>>) -> AppResult<Json<serde_json::Value>> {
    let stats = state.statistics.platform()?;
    Ok(json_single(&stats))
}
