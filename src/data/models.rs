//! Data models
//!
//! Rust structs representing database entities and query projections.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account
///
/// Accounts start inactive and are activated through the verification flow.
/// `is_deleted` is the soft-delete flag; rows stay in the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    /// Argon2 PHC-format hash
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Set on successful verification
    pub is_active: bool,
    /// Private accounts hide engagement data from other viewers
    pub is_private: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Social graph
// =============================================================================

/// Directed follow edge, unique per (follower, followed) pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: String,
    pub follower_id: String,
    pub followed_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Verification
// =============================================================================

/// Pending verification code pair for an inactive account
///
/// At most one row exists per user; reissuing deletes the old row first.
/// Consumed (deleted) on successful verification.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationCode {
    pub id: String,
    pub user_id: String,
    pub code_email: String,
    pub code_sms: String,
    pub created_at: DateTime<Utc>,
}

/// Delivery channel for a verification code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChannel {
    Email,
    Sms,
}

impl CodeChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

// =============================================================================
// Content
// =============================================================================

/// A post owned by one account
///
/// `user_id` is nullable: hard-deleting an account detaches its posts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub user_id: Option<String>,
    pub description: String,
    /// Incremented on every detail fetch
    pub views: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Media reference attached to a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostMedia {
    pub id: String,
    pub post_id: String,
    /// "photo" or "video"
    pub kind: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// A story owned by one account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Story {
    pub id: String,
    pub user_id: Option<String>,
    pub description: String,
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
    pub views: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub body: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Hashtag, unique on its text
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: String,
    pub tag: String,
    pub created_at: DateTime<Utc>,
}

/// Mention ("mark") linking an account to exactly one of post/story
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Mark {
    pub id: String,
    pub user_id: String,
    pub post_id: Option<String>,
    pub story_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Likes
// =============================================================================

/// Like relation; presence = liked, toggled rather than duplicated
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
}

/// Like target kind, selects the relation table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post,
    Story,
    Comment,
}

impl LikeTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Story => "story",
            Self::Comment => "comment",
        }
    }
}

// =============================================================================
// Query projections
// =============================================================================

/// Like row joined with the liking user's name
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LikeWithUser {
    pub id: String,
    pub user_id: String,
    pub username: String,
}

/// Comment row joined with its author's name
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithUser {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub username: String,
    pub body: String,
}

/// Mark row joined with the mentioned user's name and content summaries
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MarkWithUser {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub post_id: Option<String>,
    pub post_description: Option<String>,
    pub story_id: Option<String>,
    pub story_description: Option<String>,
}

/// Follow edge joined with both endpoint users
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowWithUsers {
    pub id: String,
    pub follower_id: String,
    pub follower_username: String,
    pub follower_email: String,
    pub follower_phone_number: String,
    pub followed_id: String,
    pub followed_username: String,
    pub followed_email: String,
}

/// Post summary used in profile and tag listings
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentSummary {
    pub id: String,
    pub description: String,
}

/// Comment summary for the owner's profile view
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentSummary {
    pub id: String,
    pub post_id: String,
    pub post_description: String,
    pub body: String,
}
