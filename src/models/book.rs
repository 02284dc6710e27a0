//! Book (catalog) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book record with copy counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i32>,
    pub total_copies: i32,
    /// Copies not attached to an active checkout
    pub available_copies: i32,
    /// Same as `available_copies`, kept for clients that read `copies`
    pub copies: i32,
}

/// Editable book fields, used for both create and full-replace update
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Page count cannot be negative"))]
    pub page_count: Option<i32>,
    /// Number of copies owned by the library
    #[serde(default)]
    #[validate(range(min = 0, message = "Copies cannot be negative"))]
    pub copies: i32,
}

impl BookInput {
    /// Trim text fields and turn blank optional ones into `None`
    pub fn normalized(mut self) -> Self {
        fn blank_to_none(s: Option<String>) -> Option<String> {
            s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }

        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.isbn = blank_to_none(self.isbn);
        self.description = blank_to_none(self.description);
        self
    }
}
