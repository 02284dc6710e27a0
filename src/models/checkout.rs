//! Checkout ledger models and borrowing rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Maximum number of books a patron may hold at once
pub const MAX_ACTIVE_CHECKOUTS: i64 = 3;

/// A currently borrowed copy
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActiveCheckout {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub checkout_date: DateTime<Utc>,
}

/// A completed borrow/return cycle. Never modified once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckoutHistory {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub checkout_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

/// Active or returned checkout as listed for a user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutEntry {
    pub id: i32,
    pub book_id: i32,
    pub checkout_date: DateTime<Utc>,
    /// `null` while the book is still out
    pub return_date: Option<DateTime<Utc>>,
    /// `null` when the book has since been removed from the catalog
    pub title: Option<String>,
    pub author: Option<String>,
}

/// State observed under lock before a checkout is granted
#[derive(Debug, Clone, Copy)]
pub struct CheckoutEligibility {
    pub active_count: i64,
    pub holds_book: bool,
    pub available_copies: i32,
}

impl CheckoutEligibility {
    /// Apply the borrowing rules in order: limit, duplicate, availability
    pub fn check(&self) -> AppResult<()> {
        if self.active_count >= MAX_ACTIVE_CHECKOUTS {
            return Err(AppError::LimitReached(MAX_ACTIVE_CHECKOUTS));
        }
        if self.holds_book {
            return Err(AppError::DuplicateCheckout);
        }
        if self.available_copies < 1 {
            return Err(AppError::Unavailable);
        }
        Ok(())
    }
}

/// Checkout and return request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub book_id: Option<i64>,
}

impl BookRequest {
    /// The requested book id, which must be a positive integer
    pub fn book_id(&self) -> AppResult<i32> {
        self.book_id
            .filter(|id| *id > 0)
            .and_then(|id| i32::try_from(id).ok())
            .ok_or_else(|| AppError::Validation("Invalid bookId".to_string()))
    }
}

/// Checkout response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub message: String,
    pub checkout_id: i32,
}

/// Return response
#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnResponse {
    pub message: String,
}
