//! Book catalog and reservation endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppResult, ErrorResponse},
    models::book::{Book, CreateBook},
};

use super::AuthenticatedUser;

/// Envelope for a single book
#[derive(Serialize, ToSchema)]
pub struct BookEnvelope {
    /// HTTP status code, mirrored from the response
    pub status: u16,
    pub response: Book,
}

impl BookEnvelope {
    fn ok(book: Book) -> Json<Self> {
        Json(Self {
            status: StatusCode::OK.as_u16(),
            response: book,
        })
    }
}

/// Envelope for a list of books
#[derive(Serialize, ToSchema)]
pub struct BookListEnvelope {
    /// HTTP status code, mirrored from the response
    pub status: u16,
    pub response: Vec<Book>,
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = BookListEnvelope),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<BookListEnvelope>> {
    let books = state.services.books.list().await?;

    Ok(Json(BookListEnvelope {
        status: StatusCode::OK.as_u16(),
        response: books,
    }))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookEnvelope),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BookEnvelope>> {
    let book = state.services.books.get(&id).await?;
    Ok(BookEnvelope::ok(book))
}

/// Create a new book (admin only)
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 200, description = "Book created", body = BookEnvelope),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 401, description = "Not authenticated or not an admin", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    body: Result<Json<CreateBook>, JsonRejection>,
) -> AppResult<Json<BookEnvelope>> {
    let body = match body {
        Ok(Json(book)) => Some(book),
        Err(rejection) => {
            tracing::debug!("Unreadable book body: {}", rejection);
            None
        }
    };

    let book = state.services.books.create(&actor, body).await?;
    Ok(BookEnvelope::ok(book))
}

/// Reserve a book for the caller
#[utoipa::path(
    patch,
    path = "/books/{id}/reserve",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book reserved", body = BookEnvelope),
        (status = 400, description = "Book already reserved", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn reserve_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<BookEnvelope>> {
    let book = state.services.books.reserve(&id, &actor).await?;
    Ok(BookEnvelope::ok(book))
}

/// Return a book reserved by the caller
#[utoipa::path(
    patch,
    path = "/books/{id}/return",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = BookEnvelope),
        (status = 400, description = "Book is on loan to someone else", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<BookEnvelope>> {
    let book = state.services.books.return_book(&id, &actor).await?;
    Ok(BookEnvelope::ok(book))
}
