//! Repository layer for book and user storage

pub mod books;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    config::DatabaseConfig,
    error::AppResult,
    models::{Book, CreateBook, User},
};

/// Persistent book collection keyed by store-assigned ids
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books, oldest first
    async fn list(&self) -> AppResult<Vec<Book>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;

    /// Insert a new, unreserved book
    async fn insert(&self, book: CreateBook) -> AppResult<Book>;

    /// Reserve the book for `member_id` if it is currently free.
    ///
    /// Returns `None` when no book was updated, either because it does not
    /// exist or because it is already reserved.
    async fn reserve(&self, id: Uuid, member_id: &str) -> AppResult<Option<Book>>;

    /// Release the book if it is currently held by `member_id`.
    ///
    /// Returns `None` when no book was updated.
    async fn release(&self, id: Uuid, member_id: &str) -> AppResult<Option<Book>>;

    /// Check the store is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// Read access to user records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
}

/// Main repository struct holding the store backends
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub users: Arc<dyn UserStore>,
}

impl Repository {
    pub fn new(books: Arc<dyn BookStore>, users: Arc<dyn UserStore>) -> Self {
        Self { books, users }
    }

    /// Repository backed by PostgreSQL
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            users: Arc::new(users::UsersRepository::new(pool)),
        }
    }

    /// Repository backed by an in-process store
    pub fn in_memory(store: memory::MemoryStore) -> Self {
        Self {
            books: Arc::new(store.clone()),
            users: Arc::new(store),
        }
    }

    /// In-process repository holding the users listed in `database.seed_users`
    pub async fn in_memory_from_config(config: &DatabaseConfig) -> Self {
        Self::in_memory(memory::MemoryStore::seeded(&config.seed_users).await)
    }
}
