use crate::{
    AppState, dto::GroupPage, errors::ApiError, feed, pagination::PaginationParams,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};

/// GET /group/:slug/
/// Query: ?page=N
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<GroupPage>, ApiError> {
    let group = state.store.group_by_slug(&slug).ok_or(ApiError::NotFound)?;
    let page_obj = feed::group_feed(&state.store, &group, &params);

    Ok(Json(GroupPage { group, page_obj }))
}
