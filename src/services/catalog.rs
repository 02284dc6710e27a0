//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookInput},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all books
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Get a single book
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book; all copies start available
    pub async fn create_book(&self, input: BookInput) -> AppResult<Book> {
        let input = validated(input)?;
        let book = self.repository.books.create(&input).await?;
        tracing::info!(book_id = book.id, copies = book.total_copies, "Book created");
        Ok(book)
    }

    /// Replace a book's editable fields
    pub async fn update_book(&self, id: i32, input: BookInput) -> AppResult<Book> {
        let input = validated(input)?;
        let book = self.repository.books.update(id, &input).await?;
        tracing::info!(
            book_id = id,
            total = book.total_copies,
            available = book.available_copies,
            "Book updated"
        );
        Ok(book)
    }

    /// Delete a book that is not currently checked out
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}

fn validated(input: BookInput) -> AppResult<BookInput> {
    let input = input.normalized();
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(input)
}
