//! Checkout ledger repository.
//!
//! Every mutation runs in a single transaction. Concurrent requests are
//! serialized by row locks (`FOR UPDATE`), never by in-process mutexes, so the
//! borrowing invariants hold across several server processes. A transaction
//! dropped without `commit` is rolled back, which covers every early return.

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::checkout::{ActiveCheckout, CheckoutEligibility, CheckoutEntry, CheckoutHistory},
};

#[derive(Clone)]
pub struct CheckoutsRepository {
    pool: Pool<Postgres>,
}

impl CheckoutsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Check out one copy of `book_id` for `user_id`
    pub async fn checkout(&self, user_id: i32, book_id: i32) -> AppResult<ActiveCheckout> {
        let mut tx = self.pool.begin().await?;

        // Lock order is always user, then book
        let user: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        if user.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let available_copies: i32 =
            sqlx::query_scalar("SELECT available_copies FROM books WHERE id = $1 FOR UPDATE")
                .bind(book_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        let active_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM active_checkouts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let holds_book: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM active_checkouts WHERE user_id = $1 AND book_id = $2)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        CheckoutEligibility {
            active_count,
            holds_book,
            available_copies,
        }
        .check()?;

        sqlx::query("UPDATE books SET available_copies = available_copies - 1 WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        let checkout = sqlx::query_as::<_, ActiveCheckout>(
            r#"
            INSERT INTO active_checkouts (user_id, book_id, checkout_date)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, book_id, checkout_date
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::DuplicateCheckout,
            e => AppError::Database(e),
        })?;

        tx.commit().await?;

        Ok(checkout)
    }

    /// Return the copy of `book_id` held by `user_id`, moving it to history
    pub async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<CheckoutHistory> {
        let mut tx = self.pool.begin().await?;

        let active = sqlx::query_as::<_, ActiveCheckout>(
            r#"
            SELECT id, user_id, book_id, checkout_date
            FROM active_checkouts
            WHERE user_id = $1 AND book_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("No active checkout found for this book and user.".to_string())
        })?;

        let history = sqlx::query_as::<_, CheckoutHistory>(
            r#"
            INSERT INTO checkout_history (user_id, book_id, checkout_date, return_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, book_id, checkout_date, return_date
            "#,
        )
        .bind(active.user_id)
        .bind(active.book_id)
        .bind(active.checkout_date)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM active_checkouts WHERE id = $1")
            .bind(active.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET available_copies = available_copies + 1 WHERE id = $1")
            .bind(active.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(history)
    }

    /// Active checkouts followed by returned ones for a user.
    ///
    /// One statement reads both tables from the same snapshot, so a return
    /// committing mid-listing cannot show a checkout as both active and returned.
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<CheckoutEntry>> {
        let entries = sqlx::query_as::<_, CheckoutEntry>(
            r#"
            SELECT ac.id, ac.book_id, ac.checkout_date,
                   NULL::timestamptz AS return_date,
                   b.title, b.author,
                   FALSE AS returned
            FROM active_checkouts ac
            LEFT JOIN books b ON b.id = ac.book_id
            WHERE ac.user_id = $1
            UNION ALL
            SELECT ch.id, ch.book_id, ch.checkout_date, ch.return_date,
                   b.title, b.author,
                   TRUE AS returned
            FROM checkout_history ch
            LEFT JOIN books b ON b.id = ch.book_id
            WHERE ch.user_id = $1
            ORDER BY returned, checkout_date, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            user_id,
            active = entries.iter().filter(|e| e.return_date.is_none()).count(),
            total = entries.len(),
            "Listed checkouts"
        );

        Ok(entries)
    }
}
