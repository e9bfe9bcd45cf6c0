use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A reader account from the `users` table. A session refers to at most one of these.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Article
///
/// A piece of content from the `articles` table. Anonymous readers may view a
/// limited number of public articles; `is_member_only` articles require a
/// logged-in session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Article {
    pub id: i64,
    pub author: String,
    pub title: String,
    pub content: String,
    pub preview: String,
    pub minutes_to_read: i64,
    #[ts(type = "string")]
    pub date: DateTime<Utc>,
    pub is_member_only: bool,
    // FK to users.id (the writer), absent for imported content.
    pub user_id: Option<i64>,
}

/// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /login. Rejected by the JSON extractor before it
/// reaches the access policy if `username` is missing or not a string.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: String,
}

/// NewArticle
///
/// Insert payload used by seeding and tests. Not exposed over HTTP.
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub author: String,
    pub title: String,
    pub content: String,
    pub preview: String,
    pub minutes_to_read: i64,
    pub date: DateTime<Utc>,
    pub is_member_only: bool,
    pub user_id: Option<i64>,
}

/// --- Response Payloads (Output Schemas) ---

/// MessageResponse
///
/// Body of the 401 responses that carry an explanation
/// (`Unauthorized`, `Maximum pageview limit reached`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

/// ErrorResponse
///
/// Body of 404 responses for articles (`{"error": "Article not found"}`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}
