//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Keys managed by the store; callers cannot set them on creation.
const RESERVED_KEYS: &[&str] = &[
    "_id",
    "id",
    "__v",
    "version",
    "reserved",
    "createdAt",
    "updatedAt",
];

/// Loan status of a book.
///
/// `status` is true exactly when `member_id` holds the id of the member the
/// book is reserved for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub status: bool,
    pub member_id: Option<String>,
}

impl Reservation {
    pub fn held_by(member_id: impl Into<String>) -> Self {
        Self {
            status: true,
            member_id: Some(member_id.into()),
        }
    }

    pub fn is_held_by(&self, member_id: &str) -> bool {
        self.member_id.as_deref() == Some(member_id)
    }
}

/// Book record as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub reserved: Reservation,
    /// Any additional fields supplied when the book was created
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Revision counter, bumped on every reservation change
    #[serde(skip)]
    pub version: i32,
}

/// Book row from the `books` table
#[derive(Debug, FromRow)]
pub struct BookRow {
    pub id: Uuid,
    pub title: String,
    pub fields: sqlx::types::Json<Map<String, Value>>,
    pub reserved_status: bool,
    pub reserved_member_id: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            reserved: Reservation {
                status: row.reserved_status,
                member_id: row.reserved_member_id,
            },
            fields: row.fields.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        }
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    /// Free-form fields stored alongside the book
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

impl CreateBook {
    /// Drop caller-supplied keys that belong to the store
    pub fn sanitized(mut self) -> Self {
        self.fields
            .retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));
        self
    }
}
