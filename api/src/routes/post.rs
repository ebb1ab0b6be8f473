use crate::{
    AppState,
    auth::CurrentUser,
    dto::{GroupRef, IndexPage, PostDetailPage, PostFormPage},
    errors::ApiError,
    feed,
    forms::{CommentForm, FieldErrors, PostForm, PostFormValues},
    media::save_post_image,
    models::{Post, User},
    pagination::PaginationParams,
    store::PostDraft,
};
use axum::{
    Form, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

/// Post ids are numeric; anything else is an unknown page.
pub(crate) fn parse_post_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

pub(crate) fn profile_path(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

fn detail_path(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

fn group_choices(state: &AppState) -> Vec<GroupRef> {
    state.store.groups().iter().map(GroupRef::from).collect()
}

/// GET /
/// Query: ?page=N
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Json<IndexPage> {
    Json(IndexPage {
        page_obj: feed::global_feed(&state.store, &params),
        is_index: true,
    })
}

fn detail_page(
    state: &AppState,
    post: Post,
    form: CommentForm,
    errors: FieldErrors,
) -> Result<PostDetailPage, ApiError> {
    let post_id = post.id;
    let author_posts_count = state.store.posts_by_author(&post.author_id).len();
    let view = feed::post_view(&state.store, post).ok_or(ApiError::NotFound)?;
    Ok(PostDetailPage {
        post: view,
        author_posts_count,
        comments: feed::comment_views(&state.store, state.store.comments_for_post(post_id)),
        form,
        errors,
    })
}

/// GET /posts/:id/
pub async fn post_detail(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<PostDetailPage>, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.store.post(post_id).ok_or(ApiError::NotFound)?;
    Ok(Json(detail_page(&state, post, CommentForm::default(), FieldErrors::default())?))
}

/// GET /create/
pub async fn post_create_form(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Json<PostFormPage> {
    Json(PostFormPage {
        form: PostFormValues::default(),
        groups: group_choices(&state),
        is_edit: false,
        post_id: None,
        errors: FieldErrors::default(),
    })
}

fn rejected_form(
    state: &AppState,
    values: PostFormValues,
    post_id: Option<i64>,
    errors: FieldErrors,
) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(PostFormPage {
            form: values,
            groups: group_choices(state),
            is_edit: post_id.is_some(),
            post_id,
            errors,
        }),
    )
        .into_response()
}

/// POST /create/
/// Body: multipart with `text`, optional `group` (id) and `image` (file)
pub async fn post_create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = PostForm::from_multipart(multipart).await?;
    let values = PostFormValues::from(&form);

    let cleaned = match form.clean(&state.store).await {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(rejected_form(&state, values, None, errors)),
    };

    let image = match &cleaned.image {
        Some(upload) => Some(
            save_post_image(&state.config.media_root, upload)
                .await
                .map_err(|e| ApiError::InternalError(format!("Saving image failed: {}", e)))?,
        ),
        None => None,
    };

    let post = state.store.create_post(
        user.id,
        PostDraft {
            text: cleaned.text,
            group_id: cleaned.group_id,
            image,
        },
    );

    info!("Post created: {} by user {}", post.id, user.username);

    Ok(Redirect::to(&profile_path(&user.username)).into_response())
}

/// Loads the post for editing, or tells the caller where a non-author goes.
fn editable_post(
    state: &AppState,
    raw_id: &str,
    user: &User,
) -> Result<Result<Post, Redirect>, ApiError> {
    let post_id = parse_post_id(raw_id)?;
    let post = state.store.post(post_id).ok_or(ApiError::NotFound)?;
    if post.author_id != user.id {
        warn!("User {} tried to edit post {} they do not own", user.username, post_id);
        return Ok(Err(Redirect::to(&detail_path(post_id))));
    }
    Ok(Ok(post))
}

/// GET /posts/:id/edit/
pub async fn post_edit_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Response, ApiError> {
    let post = match editable_post(&state, &post_id, &user)? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    Ok(Json(PostFormPage {
        form: PostFormValues {
            text: post.text,
            group: post.group_id.map(|id| id.to_string()),
            image: post.image,
        },
        groups: group_choices(&state),
        is_edit: true,
        post_id: Some(post.id),
        errors: FieldErrors::default(),
    })
    .into_response())
}

/// POST /posts/:id/edit/
/// Body: multipart with `text`, `group`, `image`, `image-clear`
pub async fn post_edit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let post = match editable_post(&state, &post_id, &user)? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let form = PostForm::from_multipart(multipart).await?;
    let values = PostFormValues::from(&form);
    let cleaned = match form.clean(&state.store).await {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(rejected_form(&state, values, Some(post.id), errors)),
    };

    let image = match (&cleaned.image, cleaned.clear_image) {
        (Some(upload), _) => Some(
            save_post_image(&state.config.media_root, upload)
                .await
                .map_err(|e| ApiError::InternalError(format!("Saving image failed: {}", e)))?,
        ),
        (None, true) => None,
        (None, false) => post.image,
    };

    state
        .store
        .update_post(
            post.id,
            PostDraft {
                text: cleaned.text,
                group_id: cleaned.group_id,
                image,
            },
        )
        .ok_or(ApiError::NotFound)?;

    info!("Post edited: {} by user {}", post.id, user.username);

    Ok(Redirect::to(&detail_path(post.id)).into_response())
}

/// POST /posts/:id/comment/
/// Body: urlencoded `text`
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.store.post(post_id).ok_or(ApiError::NotFound)?;

    let text = match form.clean() {
        Ok(text) => text,
        Err((form, errors)) => {
            let page = detail_page(&state, post, form, errors)?;
            return Ok((StatusCode::BAD_REQUEST, Json(page)).into_response());
        }
    };

    let comment = state.store.create_comment(post.id, user.id, text);
    info!("Comment {} added to post {} by user {}", comment.id, post.id, user.username);

    Ok(Redirect::to(&detail_path(post.id)).into_response())
}

/// DELETE /posts/:id/
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    let post = state.store.post(post_id).ok_or(ApiError::NotFound)?;

    // Check ownership
    if post.author_id != user.id {
        return Err(ApiError::Forbidden);
    }

    state.store.delete_post(post_id);

    info!("Post deleted: {} by user {}", post_id, user.username);

    Ok(StatusCode::NO_CONTENT)
}
