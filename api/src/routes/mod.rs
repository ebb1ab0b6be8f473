mod group;
mod health;
mod post;
mod profile;
mod user;

use crate::{AppState, cache::cache_page, errors::ApiError};
use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

/// Custom not-found page for any unknown route.
async fn not_found(req: Request) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
          "error": "Not Found",
          "path": req.uri().path()
        })),
    )
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request timed out");
        ApiError::Timeout
    } else {
        ApiError::InternalError(format!("Unhandled middleware error: {}", err))
    }
}

pub fn router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let index = get(post::index).layer(middleware::from_fn_with_state(state.clone(), cache_page));

    Router::new()
        // Feeds
        .route("/", index)
        .route("/group/{slug}/", get(group::group_posts))
        .route("/profile/{username}/", get(profile::profile))
        .route("/follow/", get(profile::follow_index))
        // Posts
        .route("/create/", get(post::post_create_form).post(post::post_create))
        .route("/posts/{post_id}/", get(post::post_detail).delete(post::delete_post))
        .route("/posts/{post_id}/edit/", get(post::post_edit_form).post(post::post_edit))
        .route("/posts/{post_id}/comment/", post(post::add_comment))
        // Follow edges
        .route(
            "/profile/{username}/follow/",
            get(profile::profile_follow).post(profile::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            get(profile::profile_unfollow).post(profile::profile_unfollow),
        )
        // Accounts
        .route("/auth/signup/", post(user::signup))
        .route("/auth/login/", get(user::login_page).post(user::login))
        .route("/users/me/", get(user::get_current_user))
        .route("/health", get(health::health_check))
        .nest_service("/media", ServeDir::new(&state.config.media_root))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(state.config.request_timeout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
