use crate::{
    AppState,
    auth::{CurrentUser, create_token},
    dto::{AuthResponse, LoginPage, LoginRequest, NextParam, SignupRequest, UserResponse},
    errors::ApiError,
    forms::FieldErrors,
};
use axum::{
    Json,
    extract::{Query, State},
};
use bcrypt::{hash, verify};
use tracing::info;
use validator::Validate;

/// POST /auth/signup/
/// Body: { "email": "...", "username": "...", "password": "..." }
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(FieldErrors::from(e)))?;

    if state.store.user_by_email(&payload.email).is_some()
        || state.store.user_by_username(&payload.username).is_some()
    {
        return Err(ApiError::UserAlreadyExists);
    }

    let hashed_password = hash(&payload.password, state.config.bcrypt_cost)
        .map_err(|e| ApiError::InternalError(format!("Password hashing failed: {}", e)))?;

    let user = state
        .store
        .create_user(&payload.email, &payload.username, hashed_password)?;

    let token = create_token(
        &user.id,
        &user.email,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    info!("New user registered: {}", user.username);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
        redirect_to: "/".to_string(),
    }))
}

/// GET /auth/login/?next=/create/
/// Where anonymous visitors of protected pages land.
pub async fn login_page(Query(next): Query<NextParam>) -> Json<LoginPage> {
    Json(LoginPage {
        action: "/auth/login/",
        next: next.target(),
    })
}

/// POST /auth/login/?next=...
/// Body: { "email": "...", "password": "..." }
pub async fn login(
    State(state): State<AppState>,
    Query(next): Query<NextParam>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(FieldErrors::from(e)))?;

    let user = state
        .store
        .user_by_email(&payload.email)
        .ok_or(ApiError::InvalidCredentials)?;

    // Verify password
    let valid = verify(&payload.password, &user.hashed_password)
        .map_err(|e| ApiError::InternalError(format!("Password verification failed: {}", e)))?;

    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let token = create_token(
        &user.id,
        &user.email,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    info!("User logged in: {}", user.username);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
        redirect_to: next.target(),
    }))
}

/// GET /users/me/
/// Headers: Authorization: Bearer <token>
pub async fn get_current_user(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}
