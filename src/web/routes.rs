use super::handlers;
use super::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::public::index))
        .route("/health", get(handlers::public::health))
        .route(
            "/posts",
            get(handlers::posts::list).post(handlers::posts::create),
        )
        .route(
            "/posts/:slug",
            get(handlers::posts::show)
                .put(handlers::posts::update)
                .delete(handlers::posts::remove),
        )
        .route("/users/:username", get(handlers::users::profile))
        .route("/stats/global", get(handlers::stats::global))
}

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
}

pub fn account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/me",
            get(handlers::users::me).put(handlers::users::update_me),
        )
        .route("/users/me/posts", get(handlers::users::my_posts))
        .route("/stats", get(handlers::stats::dashboard))
}
