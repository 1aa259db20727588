//! Book catalog and reservation service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{AuthPayload, Book, CreateBook},
    repository::Repository,
};

const CREATE_FAILURE: &str = "Failure to create. Please check request body and try again.";
const ADMIN_REQUIRED: &str = "Please contact an admin to perform this task";

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All books in the catalog
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Get a book by its id. Any lookup failure is reported as not found.
    pub async fn get(&self, id: &str) -> AppResult<Book> {
        let not_found = || AppError::NotFound(format!("Cannot find book with id {}.", id));

        let book_id = Uuid::parse_str(id).map_err(|_| not_found())?;
        match self.repository.books.find_by_id(book_id).await {
            Ok(Some(book)) => Ok(book),
            Ok(None) => Err(not_found()),
            Err(e) => {
                tracing::error!("Lookup of book {} failed: {}", id, e);
                Err(not_found())
            }
        }
    }

    /// Create a book on behalf of an admin user.
    ///
    /// `body` is `None` when the request body could not be parsed; the
    /// admin check still runs first.
    pub async fn create(&self, actor: &AuthPayload, body: Option<CreateBook>) -> AppResult<Book> {
        self.require_admin(actor).await?;

        let book = body.ok_or_else(|| AppError::BadRequest(CREATE_FAILURE.to_string()))?;
        book.validate().map_err(|e| {
            tracing::debug!("Invalid book body: {}", e);
            AppError::BadRequest(CREATE_FAILURE.to_string())
        })?;

        let created = self
            .repository
            .books
            .insert(book.sanitized())
            .await
            .map_err(|e| {
                tracing::error!("Book insert failed: {}", e);
                AppError::BadRequest(CREATE_FAILURE.to_string())
            })?;

        let book = self
            .repository
            .books
            .find_by_id(created.id)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AppError::BadRequest(CREATE_FAILURE.to_string()))?;

        tracing::info!(book_id = %book.id, user_id = %actor.id, "Book created");
        Ok(book)
    }

    /// Reserve a free book for the acting user
    pub async fn reserve(&self, id: &str, actor: &AuthPayload) -> AppResult<Book> {
        let book_id = parse_book_id(id)?;

        match self.repository.books.reserve(book_id, &actor.id).await {
            Ok(Some(book)) => {
                tracing::info!(book_id = %book.id, member_id = %actor.id, "Book reserved");
                Ok(book)
            }
            Ok(None) => match self.find_or_bad_request(book_id).await? {
                Some(_) => Err(AppError::BadRequest(format!(
                    "Book_id {} is already reserved",
                    id
                ))),
                None => Err(invalid_book_id(id)),
            },
            Err(e) => Err(unexpected(e)),
        }
    }

    /// Return a book held by the acting user
    pub async fn return_book(&self, id: &str, actor: &AuthPayload) -> AppResult<Book> {
        let book_id = parse_book_id(id)?;

        match self.repository.books.release(book_id, &actor.id).await {
            Ok(Some(book)) => {
                tracing::info!(book_id = %book.id, member_id = %actor.id, "Book returned");
                Ok(book)
            }
            Ok(None) => match self.find_or_bad_request(book_id).await? {
                Some(_) => Err(AppError::BadRequest(format!(
                    "Book_id {} is on loan to someone else",
                    id
                ))),
                None => Err(invalid_book_id(id)),
            },
            Err(e) => Err(unexpected(e)),
        }
    }

    /// Check the book store is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.ping().await
    }

    async fn require_admin(&self, actor: &AuthPayload) -> AppResult<()> {
        let user_id = actor
            .user_id()
            .ok_or_else(|| AppError::Unauthorized(ADMIN_REQUIRED.to_string()))?;

        let user = self
            .repository
            .users
            .find_by_id(user_id)
            .await
            .map_err(unexpected)?;

        match user {
            Some(user) if user.admin => Ok(()),
            _ => Err(AppError::Unauthorized(ADMIN_REQUIRED.to_string())),
        }
    }

    async fn find_or_bad_request(&self, id: Uuid) -> AppResult<Option<Book>> {
        self.repository.books.find_by_id(id).await.map_err(unexpected)
    }
}

fn parse_book_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| invalid_book_id(id))
}

fn invalid_book_id(id: &str) -> AppError {
    AppError::NotFound(format!("Invalid Book _id: {}", id))
}

/// Store failures on the write paths are reported as bad requests
fn unexpected(e: AppError) -> AppError {
    tracing::error!("Book store failure: {}", e);
    AppError::BadRequest("Unable to process the request for this book".to_string())
}
