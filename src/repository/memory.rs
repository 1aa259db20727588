//! In-process store, used when no database is configured

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::SeedUser,
    error::AppResult,
    models::{Book, CreateBook, Reservation, User},
};

use super::{BookStore, UserStore};

#[derive(Default)]
struct Collections {
    books: HashMap<Uuid, Book>,
    users: HashMap<Uuid, User>,
}

/// Books and users held in memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the configured users
    pub async fn seeded(users: &[SeedUser]) -> Self {
        let store = Self::new();
        for seed in users {
            store
                .insert_user(User {
                    id: seed.id,
                    username: seed.username.clone(),
                    password: String::new(),
                    admin: seed.admin,
                    created_at: Utc::now(),
                })
                .await;
        }
        store
    }

    /// Add or replace a user record
    pub async fn insert_user(&self, user: User) {
        self.inner.write().await.users.insert(user.id, user);
    }

    /// Change a book's reservation under the write lock.
    ///
    /// `apply` sees the current reservation and returns the new one, or
    /// `None` to leave the book untouched.
    async fn update_reservation<F>(&self, id: Uuid, apply: F) -> Option<Book>
    where
        F: FnOnce(&Reservation) -> Option<Reservation>,
    {
        let mut inner = self.inner.write().await;
        let book = inner.books.get_mut(&id)?;
        let reserved = apply(&book.reserved)?;

        book.reserved = reserved;
        book.version += 1;
        book.updated_at = Utc::now();
        Some(book.clone())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let mut books: Vec<Book> = self.inner.read().await.books.values().cloned().collect();
        books.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(books)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.inner.read().await.books.get(&id).cloned())
    }

    async fn insert(&self, book: CreateBook) -> AppResult<Book> {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4(),
            title: book.title,
            reserved: Reservation::default(),
            fields: book.fields,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        self.inner.write().await.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn reserve(&self, id: Uuid, member_id: &str) -> AppResult<Option<Book>> {
        Ok(self
            .update_reservation(id, |current| {
                (!current.status).then(|| Reservation::held_by(member_id))
            })
            .await)
    }

    async fn release(&self, id: Uuid, member_id: &str) -> AppResult<Option<Book>> {
        Ok(self
            .update_reservation(id, |current| {
                current.is_held_by(member_id).then(Reservation::default)
            })
            .await)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }
}
