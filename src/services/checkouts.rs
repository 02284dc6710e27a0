//! Checkout ledger service

use crate::{
    error::{AppError, AppResult},
    models::checkout::{ActiveCheckout, CheckoutEntry, CheckoutHistory},
    repository::Repository,
};

#[derive(Clone)]
pub struct CheckoutsService {
    repository: Repository,
}

impl CheckoutsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check out a book for a user.
    ///
    /// Failures are reported in a fixed order: missing user or book, then
    /// the per-user limit, then an existing checkout of the same book, then
    /// availability. Nothing is retried here.
    pub async fn checkout(&self, user_id: i32, book_id: i32) -> AppResult<ActiveCheckout> {
        ensure_positive(book_id)?;

        let checkout = self.repository.checkouts.checkout(user_id, book_id).await?;
        tracing::info!(
            user_id,
            book_id,
            checkout_id = checkout.id,
            "Book checked out"
        );
        Ok(checkout)
    }

    /// Return a book previously checked out by the user
    pub async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<CheckoutHistory> {
        ensure_positive(book_id)?;

        let history = self.repository.checkouts.return_book(user_id, book_id).await?;
        tracing::info!(user_id, book_id, history_id = history.id, "Book returned");
        Ok(history)
    }

    /// Active and returned checkouts for a user
    pub async fn list_checkouts(&self, user_id: i32) -> AppResult<Vec<CheckoutEntry>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository.checkouts.list_for_user(user_id).await
    }
}

fn ensure_positive(book_id: i32) -> AppResult<()> {
    if book_id <= 0 {
        return Err(AppError::Validation("Invalid bookId".to_string()));
    }
    Ok(())
}
