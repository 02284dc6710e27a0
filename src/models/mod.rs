//! Data models for the library server

pub mod book;
pub mod checkout;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookInput};
pub use checkout::{ActiveCheckout, CheckoutEntry, CheckoutHistory};
pub use user::{Role, User, UserClaims};
