//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book::{Book, BookRow, CreateBook},
};

use super::BookStore;

const BOOK_COLUMNS: &str = "id, title, fields, reserved_status, reserved_member_id, version, created_at, updated_at";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {} FROM books ORDER BY created_at, id",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {} FROM books WHERE id = $1",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn insert(&self, book: CreateBook) -> AppResult<Book> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            INSERT INTO books (id, title, fields)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(sqlx::types::Json(&book.fields))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn reserve(&self, id: Uuid, member_id: &str) -> AppResult<Option<Book>> {
        // Single conditional UPDATE: concurrent reservations cannot both match.
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            UPDATE books
            SET reserved_status = TRUE,
                reserved_member_id = $2,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND reserved_status = FALSE
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn release(&self, id: Uuid, member_id: &str) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            UPDATE books
            SET reserved_status = FALSE,
                reserved_member_id = NULL,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND reserved_member_id = $2
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
