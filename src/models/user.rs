//! User model and token claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Library member. Only the admin flag matters to the book endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Claims carried by a verified bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    /// Id of the acting user
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl AuthPayload {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            exp: None,
            iat: None,
        }
    }

    /// Payload expiring `hours` from now
    pub fn expiring_in(id: impl Into<String>, hours: i64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            exp: Some((now + chrono::Duration::hours(hours)).timestamp()),
            iat: Some(now.timestamp()),
        }
    }

    /// Sign the payload into a JWT
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Verify a JWT signed with `secret` and return its payload.
    ///
    /// `exp` is checked when the token carries one; `aud` is not checked.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(token_data.claims)
    }

    /// Id as a user key, if it is one
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }
}
