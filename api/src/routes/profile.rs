use crate::{
    AppState,
    auth::{CurrentUser, MaybeUser},
    dto::{AuthorRef, FollowPage, ProfilePage},
    errors::ApiError,
    feed,
    pagination::PaginationParams,
    routes::post::profile_path,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use tracing::info;

/// GET /profile/:username/
/// Query: ?page=N
pub async fn profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ProfilePage>, ApiError> {
    let author = state
        .store
        .user_by_username(&username)
        .ok_or(ApiError::NotFound)?;

    let profile = feed::profile_feed(&state.store, &author, viewer.as_ref(), &params);

    Ok(Json(ProfilePage {
        author: AuthorRef::from(&author),
        posts_count: profile.posts_count,
        following: profile.following,
        page_obj: profile.page,
    }))
}

/// GET /follow/
/// Posts by every author the current user follows.
pub async fn follow_index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Json<FollowPage> {
    Json(FollowPage {
        page_obj: feed::follow_feed(&state.store, &user, &params),
        is_follow_index: true,
    })
}

/// GET|POST /profile/:username/follow/
pub async fn profile_follow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Redirect, ApiError> {
    let author = state
        .store
        .user_by_username(&username)
        .ok_or(ApiError::NotFound)?;

    if state.store.follow(user.id, author.id) {
        info!("{} now follows {}", user.username, author.username);
    }

    Ok(Redirect::to(&profile_path(&author.username)))
}

/// GET|POST /profile/:username/unfollow/
pub async fn profile_unfollow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Redirect, ApiError> {
    let author = state
        .store
        .user_by_username(&username)
        .ok_or(ApiError::NotFound)?;

    if !state.store.unfollow(&user.id, &author.id) {
        return Err(ApiError::NotFound);
    }
    info!("{} unfollowed {}", user.username, author.username);

    Ok(Redirect::to(&profile_path(&author.username)))
}
