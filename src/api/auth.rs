//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::user::{AuthResponse, LoginRequest, MeResponse, SignupRequest},
    AppState,
};

use super::{ApiJson, AuthenticatedUser};

/// Create an account and receive a session token
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Invalid input, with per-field validity", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role elevation denied", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email already in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let (user, token) = state.services.auth.signup(request).await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Log in with username or email
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (user, token) = state.services.auth.login(request).await?;

    Ok(Json(AuthResponse { user, token }))
}

/// Get the current user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "User no longer exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MeResponse>> {
    let user = state.services.auth.current_user(&claims).await?;

    Ok(Json(MeResponse { user }))
}
