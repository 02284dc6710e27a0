//! Books repository (catalog store)

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookInput},
};

const BOOK_COLUMNS: &str = "id, title, author, isbn, description, page_count, total_copies, \
     available_copies, available_copies AS copies";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all books ordered by id
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let query = format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS);

        let books = sqlx::query_as::<_, Book>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a book with all copies available
    pub async fn create(&self, book: &BookInput) -> AppResult<Book> {
        let query = format!(
            r#"
            INSERT INTO books (title, author, isbn, description, page_count, total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        let created = sqlx::query_as::<_, Book>(&query)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(&book.description)
            .bind(book.page_count)
            .bind(book.copies)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    /// Replace the editable fields of a book.
    ///
    /// `copies` becomes the new total; available copies are recomputed from the
    /// active checkouts while the book row is locked, so edits serialize with
    /// concurrent checkouts and returns.
    pub async fn update(&self, id: i32, book: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i32> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if locked.is_none() {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let on_loan: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM active_checkouts WHERE book_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if i64::from(book.copies) < on_loan {
            return Err(AppError::Validation(format!(
                "Copies cannot be lower than the {} copies currently checked out",
                on_loan
            )));
        }

        let query = format!(
            r#"
            UPDATE books
            SET title = $1, author = $2, isbn = $3, description = $4, page_count = $5,
                total_copies = $6, available_copies = $6 - $7
            WHERE id = $8
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        let updated = sqlx::query_as::<_, Book>(&query)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(&book.description)
            .bind(book.page_count)
            .bind(book.copies)
            .bind(on_loan as i32)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a book that has no active checkouts
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i32> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if locked.is_none() {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let on_loan: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM active_checkouts WHERE book_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if on_loan > 0 {
            return Err(AppError::BookOnLoan(on_loan));
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
