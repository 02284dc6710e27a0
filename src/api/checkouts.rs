//! Patron checkout endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::checkout::{BookRequest, CheckoutEntry, CheckoutResponse, ReturnResponse},
    AppState,
};

use super::{ApiJson, AuthenticatedUser};

/// Active and returned checkouts of a user
#[utoipa::path(
    get,
    path = "/patron/checkouts/{user_id}",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Checkouts, active ones with a null returnDate", body = Vec<CheckoutEntry>),
        (status = 403, description = "Not your checkouts", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_checkouts(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<CheckoutEntry>>> {
    claims.require_self_or_admin(user_id)?;

    let checkouts = state.services.checkouts.list_checkouts(user_id).await?;
    Ok(Json(checkouts))
}

/// Check out a book for the authenticated user
#[utoipa::path(
    post,
    path = "/patron/checkout",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book checked out", body = CheckoutResponse),
        (status = 400, description = "Invalid bookId, limit reached, already checked out or unavailable", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "User or book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn checkout_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<BookRequest>,
) -> AppResult<(StatusCode, Json<CheckoutResponse>)> {
    let book_id = request.book_id()?;

    let checkout = state.services.checkouts.checkout(claims.id, book_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            message: "Book checked out successfully.".to_string(),
            checkout_id: checkout.id,
        }),
    ))
}

/// Return a book held by the authenticated user
#[utoipa::path(
    post,
    path = "/patron/return",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 400, description = "Invalid bookId", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "No active checkout for this book", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<BookRequest>,
) -> AppResult<Json<ReturnResponse>> {
    let book_id = request.book_id()?;

    state.services.checkouts.return_book(claims.id, book_id).await?;

    Ok(Json(ReturnResponse {
        message: "Book returned successfully.".to_string(),
    }))
}
