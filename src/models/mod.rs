//! Data models for Bookshelf

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{Book, CreateBook, Reservation};
pub use user::{AuthPayload, User};
