//! SQLite database operations
//!
//! All database access goes through this module.
//! Soft-deleted rows are filtered with the same `is_deleted = 0`
//! predicate at every query boundary; nothing else reimplements it.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

fn like_table(target: LikeTarget) -> (&'static str, &'static str) {
    match target {
        LikeTarget::Post => ("post_likes", "post_id"),
        LikeTarget::Story => ("story_likes", "story_id"),
        LikeTarget::Comment => ("comment_likes", "comment_id"),
    }
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user row.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, phone_number, password_hash,
                first_name, last_name, is_active, is_private, is_deleted,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_active)
        .bind(user.is_private)
        .bind(user.is_deleted)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a user by ID, excluding soft-deleted rows.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Get a user by username, excluding soft-deleted rows.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = ? AND is_deleted = 0",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by email, excluding soft-deleted rows.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? AND is_deleted = 0")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Get a user by phone number, excluding soft-deleted rows.
    pub async fn get_user_by_phone(&self, phone_number: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE phone_number = ? AND is_deleted = 0",
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Whether a username is taken (soft-deleted rows still hold the name).
    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Whether an email is taken.
    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Whether a phone number is taken.
    pub async fn phone_exists(&self, phone_number: &str) -> Result<bool, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE phone_number = ?")
                .bind(phone_number)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Flip a user's active flag on.
    pub async fn activate_user(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET is_active = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Update profile fields by user ID.
    ///
    /// Use `None` for omitted fields (no change). Uniqueness of
    /// username/email/phone is re-checked by the caller beforehand.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching user row exists.
    pub async fn update_user_profile(
        &self,
        id: &str,
        username: Option<&str>,
        email: Option<&str>,
        phone_number: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        is_private: Option<bool>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut builder = sqlx::QueryBuilder::<Sqlite>::new("UPDATE users SET updated_at = ");
        builder.push_bind(updated_at);

        if let Some(username) = username {
            builder.push(", username = ").push_bind(username);
        }
        if let Some(email) = email {
            builder.push(", email = ").push_bind(email);
        }
        if let Some(phone_number) = phone_number {
            builder.push(", phone_number = ").push_bind(phone_number);
        }
        if let Some(first_name) = first_name {
            builder.push(", first_name = ").push_bind(first_name);
        }
        if let Some(last_name) = last_name {
            builder.push(", last_name = ").push_bind(last_name);
        }
        if let Some(is_private) = is_private {
            builder.push(", is_private = ").push_bind(is_private);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND is_deleted = 0");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    /// Soft-delete a user and deactivate the account.
    pub async fn soft_delete_user(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET is_deleted = 1, is_active = 0, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Verification codes
    // =========================================================================

    /// Replace the verification code row for a user.
    ///
    /// Deletes any prior row and inserts the new pair in one transaction,
    /// so exactly one active code pair exists per account.
    pub async fn replace_verification_code(
        &self,
        code: &VerificationCode,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM verification_codes WHERE user_id = ?")
            .bind(&code.user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO verification_codes (id, user_id, code_email, code_sms, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&code.id)
        .bind(&code.user_id)
        .bind(&code.code_email)
        .bind(&code.code_sms)
        .bind(code.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Get the pending verification code row for a user, if any.
    pub async fn get_verification_code(
        &self,
        user_id: &str,
    ) -> Result<Option<VerificationCode>, AppError> {
        let code = sqlx::query_as::<_, VerificationCode>(
            "SELECT * FROM verification_codes WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }

    /// Delete a verification code row (single-use consumption).
    pub async fn delete_verification_code(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM verification_codes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Follows
    // =========================================================================

    /// Get a follow edge by its endpoints.
    pub async fn get_follow(
        &self,
        follower_id: &str,
        followed_id: &str,
    ) -> Result<Option<Follow>, AppError> {
        let follow = sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE follower_id = ? AND followed_id = ?",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(follow)
    }

    /// Insert a follow edge.
    pub async fn insert_follow(&self, follow: &Follow) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO follows (id, follower_id, followed_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&follow.id)
        .bind(&follow.follower_id)
        .bind(&follow.followed_id)
        .bind(follow.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a follow edge by ID.
    pub async fn delete_follow(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM follows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Whether `follower_id` follows `followed_id`.
    pub async fn is_following(
        &self,
        follower_id: &str,
        followed_id: &str,
    ) -> Result<bool, AppError> {
        Ok(self.get_follow(follower_id, followed_id).await?.is_some())
    }

    /// Get a follow edge joined with both endpoint users.
    pub async fn get_follow_with_users(
        &self,
        id: &str,
    ) -> Result<Option<FollowWithUsers>, AppError> {
        let follow = sqlx::query_as::<_, FollowWithUsers>(
            r#"
            SELECT f.id, f.follower_id, fr.username AS follower_username,
                   fr.email AS follower_email, fr.phone_number AS follower_phone_number,
                   f.followed_id, fd.username AS followed_username, fd.email AS followed_email
            FROM follows f
            JOIN users fr ON fr.id = f.follower_id
            JOIN users fd ON fd.id = f.followed_id
            WHERE f.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(follow)
    }

    /// Edges pointing at `user_id` (people who follow them).
    pub async fn followers_of(&self, user_id: &str) -> Result<Vec<FollowWithUsers>, AppError> {
        let follows = sqlx::query_as::<_, FollowWithUsers>(
            r#"
            SELECT f.id, f.follower_id, fr.username AS follower_username,
                   fr.email AS follower_email, fr.phone_number AS follower_phone_number,
                   f.followed_id, fd.username AS followed_username, fd.email AS followed_email
            FROM follows f
            JOIN users fr ON fr.id = f.follower_id
            JOIN users fd ON fd.id = f.followed_id
            WHERE f.followed_id = ?
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(follows)
    }

    /// Edges originating at `user_id` (people they follow).
    pub async fn following_of(&self, user_id: &str) -> Result<Vec<FollowWithUsers>, AppError> {
        let follows = sqlx::query_as::<_, FollowWithUsers>(
            r#"
            SELECT f.id, f.follower_id, fr.username AS follower_username,
                   fr.email AS follower_email, fr.phone_number AS follower_phone_number,
                   f.followed_id, fd.username AS followed_username, fd.email AS followed_email
            FROM follows f
            JOIN users fr ON fr.id = f.follower_id
            JOIN users fd ON fd.id = f.followed_id
            WHERE f.follower_id = ?
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(follows)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a post together with its media, tag links and marks atomically.
    ///
    /// Tags are upserted by text; marks are get-or-create per mentioned user.
    pub async fn insert_post_bundle(
        &self,
        post: &Post,
        media: &[(String, String)],
        tags: &[String],
        mark_user_ids: &[String],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, description, views, is_deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.user_id)
        .bind(&post.description)
        .bind(post.views)
        .bind(post.is_deleted)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut *tx)
        .await?;

        for (kind, url) in media {
            sqlx::query(
                "INSERT INTO post_media (id, post_id, kind, url, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(EntityId::new().0)
            .bind(&post.id)
            .bind(kind)
            .bind(url)
            .bind(post.created_at)
            .execute(&mut *tx)
            .await?;
        }

        for tag in tags {
            let tag_id = match sqlx::query_scalar::<_, String>("SELECT id FROM tags WHERE tag = ?")
                .bind(tag)
                .fetch_optional(&mut *tx)
                .await?
            {
                Some(id) => id,
                None => {
                    let id = EntityId::new().0;
                    sqlx::query("INSERT INTO tags (id, tag, created_at) VALUES (?, ?, ?)")
                        .bind(&id)
                        .bind(tag)
                        .bind(post.created_at)
                        .execute(&mut *tx)
                        .await?;
                    id
                }
            };

            sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
                .bind(&post.id)
                .bind(&tag_id)
                .execute(&mut *tx)
                .await?;
        }

        for user_id in mark_user_ids {
            sqlx::query(
                r#"
                INSERT INTO marks (id, user_id, post_id, story_id, created_at)
                SELECT ?, ?, ?, NULL, ?
                WHERE NOT EXISTS (SELECT 1 FROM marks WHERE user_id = ? AND post_id = ?)
                "#,
            )
            .bind(EntityId::new().0)
            .bind(user_id)
            .bind(&post.id)
            .bind(post.created_at)
            .bind(user_id)
            .bind(&post.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Get a post by ID, excluding soft-deleted rows.
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post =
            sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(post)
    }

    /// List posts, optionally filtering on description substring.
    pub async fn list_posts(&self, q: Option<&str>) -> Result<Vec<Post>, AppError> {
        let posts = match q {
            Some(q) => {
                sqlx::query_as::<_, Post>(
                    r#"
                    SELECT * FROM posts
                    WHERE is_deleted = 0 AND description LIKE '%' || ? || '%'
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(q)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Post>(
                    "SELECT * FROM posts WHERE is_deleted = 0 ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(posts)
    }

    /// List a user's posts, optionally filtering on description substring.
    pub async fn list_posts_by_user(
        &self,
        user_id: &str,
        q: Option<&str>,
    ) -> Result<Vec<Post>, AppError> {
        let posts = match q {
            Some(q) => {
                sqlx::query_as::<_, Post>(
                    r#"
                    SELECT * FROM posts
                    WHERE user_id = ? AND is_deleted = 0 AND description LIKE '%' || ? || '%'
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(user_id)
                .bind(q)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Post>(
                    "SELECT * FROM posts WHERE user_id = ? AND is_deleted = 0 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(posts)
    }

    /// Increment a post's view counter by one.
    pub async fn increment_post_views(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE posts SET views = views + 1 WHERE id = ? AND is_deleted = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Update a post's description.
    pub async fn update_post_description(
        &self,
        id: &str,
        description: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE posts SET description = ?, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(description)
        .bind(updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Soft-delete a post.
    pub async fn soft_delete_post(&self, id: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE posts SET is_deleted = 1, updated_at = ? WHERE id = ? AND is_deleted = 0")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Media references attached to a post.
    pub async fn media_by_post(&self, post_id: &str) -> Result<Vec<PostMedia>, AppError> {
        let media = sqlx::query_as::<_, PostMedia>(
            "SELECT * FROM post_media WHERE post_id = ? ORDER BY created_at",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(media)
    }

    /// Tags linked to a post.
    pub async fn tags_by_post(&self, post_id: &str) -> Result<Vec<Tag>, AppError> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.* FROM tags t
            JOIN post_tags pt ON pt.tag_id = t.id
            WHERE pt.post_id = ?
            ORDER BY t.tag
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Marks on a post, joined with the mentioned users.
    pub async fn marks_by_post(&self, post_id: &str) -> Result<Vec<MarkWithUser>, AppError> {
        let marks = sqlx::query_as::<_, MarkWithUser>(
            r#"
            SELECT m.id, m.user_id, u.username,
                   m.post_id, p.description AS post_description,
                   m.story_id, NULL AS story_description
            FROM marks m
            JOIN users u ON u.id = m.user_id
            JOIN posts p ON p.id = m.post_id
            WHERE m.post_id = ?
            ORDER BY m.created_at
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(marks)
    }

    /// Comments on a post joined with their authors, soft-deleted excluded.
    pub async fn comments_by_post(
        &self,
        post_id: &str,
        q: Option<&str>,
    ) -> Result<Vec<CommentWithUser>, AppError> {
        let comments = match q {
            Some(q) => {
                sqlx::query_as::<_, CommentWithUser>(
                    r#"
                    SELECT c.id, c.post_id, c.user_id, u.username, c.body
                    FROM comments c
                    JOIN users u ON u.id = c.user_id
                    WHERE c.post_id = ? AND c.is_deleted = 0 AND c.body LIKE '%' || ? || '%'
                    ORDER BY c.created_at
                    "#,
                )
                .bind(post_id)
                .bind(q)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CommentWithUser>(
                    r#"
                    SELECT c.id, c.post_id, c.user_id, u.username, c.body
                    FROM comments c
                    JOIN users u ON u.id = c.user_id
                    WHERE c.post_id = ? AND c.is_deleted = 0
                    ORDER BY c.created_at
                    "#,
                )
                .bind(post_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(comments)
    }

    // =========================================================================
    // Stories
    // =========================================================================

    /// Insert a story together with its tag links and marks atomically.
    pub async fn insert_story_bundle(
        &self,
        story: &Story,
        tags: &[String],
        mark_user_ids: &[String],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO stories (id, user_id, description, photo_url, video_url, views, is_deleted, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&story.id)
        .bind(&story.user_id)
        .bind(&story.description)
        .bind(&story.photo_url)
        .bind(&story.video_url)
        .bind(story.views)
        .bind(story.is_deleted)
        .bind(story.created_at)
        .execute(&mut *tx)
        .await?;

        for tag in tags {
            let tag_id = match sqlx::query_scalar::<_, String>("SELECT id FROM tags WHERE tag = ?")
                .bind(tag)
                .fetch_optional(&mut *tx)
                .await?
            {
                Some(id) => id,
                None => {
                    let id = EntityId::new().0;
                    sqlx::query("INSERT INTO tags (id, tag, created_at) VALUES (?, ?, ?)")
                        .bind(&id)
                        .bind(tag)
                        .bind(story.created_at)
                        .execute(&mut *tx)
                        .await?;
                    id
                }
            };

            sqlx::query("INSERT OR IGNORE INTO story_tags (story_id, tag_id) VALUES (?, ?)")
                .bind(&story.id)
                .bind(&tag_id)
                .execute(&mut *tx)
                .await?;
        }

        for user_id in mark_user_ids {
            sqlx::query(
                r#"
                INSERT INTO marks (id, user_id, post_id, story_id, created_at)
                SELECT ?, ?, NULL, ?, ?
                WHERE NOT EXISTS (SELECT 1 FROM marks WHERE user_id = ? AND story_id = ?)
                "#,
            )
            .bind(EntityId::new().0)
            .bind(user_id)
            .bind(&story.id)
            .bind(story.created_at)
            .bind(user_id)
            .bind(&story.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Get a story by ID, excluding soft-deleted rows.
    pub async fn get_story(&self, id: &str) -> Result<Option<Story>, AppError> {
        let story =
            sqlx::query_as::<_, Story>("SELECT * FROM stories WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(story)
    }

    /// List stories, optionally filtering on description substring.
    pub async fn list_stories(&self, q: Option<&str>) -> Result<Vec<Story>, AppError> {
        let stories = match q {
            Some(q) => {
                sqlx::query_as::<_, Story>(
                    r#"
                    SELECT * FROM stories
                    WHERE is_deleted = 0 AND description LIKE '%' || ? || '%'
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(q)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Story>(
                    "SELECT * FROM stories WHERE is_deleted = 0 ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(stories)
    }

    /// Increment a story's view counter by one.
    pub async fn increment_story_views(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE stories SET views = views + 1 WHERE id = ? AND is_deleted = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Update a story's editable fields.
    pub async fn update_story(
        &self,
        id: &str,
        description: Option<&str>,
        photo_url: Option<&str>,
        video_url: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut builder = sqlx::QueryBuilder::<Sqlite>::new("UPDATE stories SET id = id");

        if let Some(description) = description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(photo_url) = photo_url {
            builder.push(", photo_url = ").push_bind(photo_url);
        }
        if let Some(video_url) = video_url {
            builder.push(", video_url = ").push_bind(video_url);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND is_deleted = 0");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    /// Soft-delete a story.
    pub async fn soft_delete_story(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE stories SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Tags linked to a story.
    pub async fn tags_by_story(&self, story_id: &str) -> Result<Vec<Tag>, AppError> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.* FROM tags t
            JOIN story_tags st ON st.tag_id = t.id
            WHERE st.story_id = ?
            ORDER BY t.tag
            "#,
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Marks on a story, joined with the mentioned users.
    pub async fn marks_by_story(&self, story_id: &str) -> Result<Vec<MarkWithUser>, AppError> {
        let marks = sqlx::query_as::<_, MarkWithUser>(
            r#"
            SELECT m.id, m.user_id, u.username,
                   m.post_id, NULL AS post_description,
                   m.story_id, s.description AS story_description
            FROM marks m
            JOIN users u ON u.id = m.user_id
            JOIN stories s ON s.id = m.story_id
            WHERE m.story_id = ?
            ORDER BY m.created_at
            "#,
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(marks)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a comment row.
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, user_id, body, is_deleted, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.user_id)
        .bind(&comment.body)
        .bind(comment.is_deleted)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a comment by ID, excluding soft-deleted rows.
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment =
            sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(comment)
    }

    /// List all comments joined with authors, optionally filtering on body.
    pub async fn list_comments(&self, q: Option<&str>) -> Result<Vec<CommentWithUser>, AppError> {
        let comments = match q {
            Some(q) => {
                sqlx::query_as::<_, CommentWithUser>(
                    r#"
                    SELECT c.id, c.post_id, c.user_id, u.username, c.body
                    FROM comments c
                    JOIN users u ON u.id = c.user_id
                    WHERE c.is_deleted = 0 AND c.body LIKE '%' || ? || '%'
                    ORDER BY c.created_at
                    "#,
                )
                .bind(q)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CommentWithUser>(
                    r#"
                    SELECT c.id, c.post_id, c.user_id, u.username, c.body
                    FROM comments c
                    JOIN users u ON u.id = c.user_id
                    WHERE c.is_deleted = 0
                    ORDER BY c.created_at
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(comments)
    }

    /// Update a comment's body.
    pub async fn update_comment_body(&self, id: &str, body: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE comments SET body = ? WHERE id = ? AND is_deleted = 0")
                .bind(body)
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Soft-delete a comment.
    pub async fn soft_delete_comment(&self, id: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE comments SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Likes (posts, stories, comments share one shape)
    // =========================================================================

    /// Get a like relation by actor and target.
    pub async fn get_like(
        &self,
        target: LikeTarget,
        user_id: &str,
        target_id: &str,
    ) -> Result<Option<Like>, AppError> {
        let (table, column) = like_table(target);
        let sql = format!(
            "SELECT id, user_id, {column} AS target_id, created_at FROM {table} WHERE user_id = ? AND {column} = ?"
        );

        let like = sqlx::query_as::<_, Like>(&sql)
            .bind(user_id)
            .bind(target_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(like)
    }

    /// Insert a like relation.
    pub async fn insert_like(&self, target: LikeTarget, like: &Like) -> Result<(), AppError> {
        let (table, column) = like_table(target);
        let sql =
            format!("INSERT INTO {table} (id, user_id, {column}, created_at) VALUES (?, ?, ?, ?)");

        sqlx::query(&sql)
            .bind(&like.id)
            .bind(&like.user_id)
            .bind(&like.target_id)
            .bind(like.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a like relation by ID.
    pub async fn delete_like(&self, target: LikeTarget, id: &str) -> Result<(), AppError> {
        let (table, _) = like_table(target);
        let sql = format!("DELETE FROM {table} WHERE id = ?");

        sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        Ok(())
    }

    /// Whether `user_id` has liked the target.
    pub async fn is_liked_by(
        &self,
        target: LikeTarget,
        target_id: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        Ok(self.get_like(target, user_id, target_id).await?.is_some())
    }

    /// Likes on a target joined with the liking users.
    pub async fn likes_by_target(
        &self,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<Vec<LikeWithUser>, AppError> {
        let (table, column) = like_table(target);
        let sql = format!(
            r#"
            SELECT l.id, l.user_id, u.username
            FROM {table} l
            JOIN users u ON u.id = l.user_id
            WHERE l.{column} = ?
            ORDER BY l.created_at
            "#
        );

        let likes = sqlx::query_as::<_, LikeWithUser>(&sql)
            .bind(target_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(likes)
    }

    // =========================================================================
    // Profile aggregates
    // =========================================================================

    /// Number of active comments authored by a user.
    pub async fn count_user_comments(&self, user_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments WHERE user_id = ? AND is_deleted = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Number of likes a user has given on a target kind.
    pub async fn count_user_likes(
        &self,
        target: LikeTarget,
        user_id: &str,
    ) -> Result<i64, AppError> {
        let (table, _) = like_table(target);
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE user_id = ?");

        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Active post summaries owned by a user.
    pub async fn post_summaries_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ContentSummary>, AppError> {
        let posts = sqlx::query_as::<_, ContentSummary>(
            r#"
            SELECT id, description FROM posts
            WHERE user_id = ? AND is_deleted = 0
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Active story summaries owned by a user.
    pub async fn story_summaries_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ContentSummary>, AppError> {
        let stories = sqlx::query_as::<_, ContentSummary>(
            r#"
            SELECT id, description FROM stories
            WHERE user_id = ? AND is_deleted = 0
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(stories)
    }

    /// Active comment summaries authored by a user, with parent post text.
    pub async fn comment_summaries_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<CommentSummary>, AppError> {
        let comments = sqlx::query_as::<_, CommentSummary>(
            r#"
            SELECT c.id, c.post_id, p.description AS post_description, c.body
            FROM comments c
            JOIN posts p ON p.id = c.post_id
            WHERE c.user_id = ? AND c.is_deleted = 0
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Marks mentioning a user, joined with the content summaries.
    pub async fn marks_by_user(&self, user_id: &str) -> Result<Vec<MarkWithUser>, AppError> {
        let marks = sqlx::query_as::<_, MarkWithUser>(
            r#"
            SELECT m.id, m.user_id, u.username,
                   m.post_id, p.description AS post_description,
                   m.story_id, s.description AS story_description
            FROM marks m
            JOIN users u ON u.id = m.user_id
            LEFT JOIN posts p ON p.id = m.post_id
            LEFT JOIN stories s ON s.id = m.story_id
            WHERE m.user_id = ?
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(marks)
    }
}
