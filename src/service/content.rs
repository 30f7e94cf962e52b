//! Content service
//!
//! Posts, stories, comments and the like toggles, plus the tag/mention
//! extraction that runs on every description.

use std::sync::Arc;

use chrono::Utc;

use crate::data::{
    Comment, Database, EntityId, Like, LikeTarget, LikeWithUser, Post, Story, User,
};
use crate::error::AppError;
use crate::metrics::{CONTENT_VIEWS_TOTAL, TOGGLES_TOTAL};

/// Tags and mentions pulled out of a description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Hashtag texts, `#` stripped, first-occurrence order
    pub tags: Vec<String>,
    /// Mentioned usernames, `@` stripped and lowercased
    pub mentions: Vec<String>,
}

/// Extract `#tags` and `@mentions` from free text.
///
/// Tokens are whitespace-delimited; a bare `#` or `@` is ignored and
/// duplicates collapse to the first occurrence. Mentions are lowercased
/// here; whether they resolve to accounts is decided at save time.
pub fn extract_tags_and_mentions(text: &str) -> Extraction {
    let mut extraction = Extraction::default();

    for token in text.split_whitespace() {
        if let Some(tag) = token.strip_prefix('#') {
            if !tag.is_empty() && !extraction.tags.iter().any(|t| t == tag) {
                extraction.tags.push(tag.to_string());
            }
        } else if let Some(mention) = token.strip_prefix('@') {
            let mention = mention.to_lowercase();
            if !mention.is_empty() && !extraction.mentions.iter().any(|m| m == &mention) {
                extraction.mentions.push(mention);
            }
        }
    }

    extraction
}

/// New-post input
#[derive(Debug, Clone)]
pub struct PostInput {
    pub description: String,
    /// (kind, url) pairs; kind is "photo" or "video"
    pub media: Vec<(String, String)>,
}

/// New-story input
#[derive(Debug, Clone)]
pub struct StoryInput {
    pub description: String,
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
}

/// Outcome of a like toggle
#[derive(Debug)]
pub enum LikeToggle {
    Added(LikeWithUser),
    Removed,
}

/// Content service
pub struct ContentService {
    db: Arc<Database>,
}

impl ContentService {
    /// Create new content service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Resolve mentioned usernames to user IDs, dropping unknown names.
    async fn resolve_mentions(&self, mentions: &[String]) -> Result<Vec<String>, AppError> {
        let mut user_ids = Vec::new();
        for username in mentions {
            if let Some(user) = self.db.get_user_by_username(username).await? {
                user_ids.push(user.id);
            }
        }
        Ok(user_ids)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Create a post; tags and mentions are extracted from the description
    /// and persisted in the same transaction as the post row.
    pub async fn create_post(&self, actor: &User, input: PostInput) -> Result<Post, AppError> {
        let description = input.description.trim().to_string();
        if description.is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }
        for (kind, _) in &input.media {
            if kind != "photo" && kind != "video" {
                return Err(AppError::Validation(
                    "Media kind must be photo or video".to_string(),
                ));
            }
        }

        let extraction = extract_tags_and_mentions(&description);
        let mark_user_ids = self.resolve_mentions(&extraction.mentions).await?;

        let now = Utc::now();
        let post = Post {
            id: EntityId::new().0,
            user_id: Some(actor.id.clone()),
            description,
            views: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        self.db
            .insert_post_bundle(&post, &input.media, &extraction.tags, &mark_user_ids)
            .await?;

        Ok(post)
    }

    /// Fetch a post and count the view.
    pub async fn view_post(&self, id: &str) -> Result<Post, AppError> {
        let post = self
            .db
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        self.db.increment_post_views(&post.id).await?;
        CONTENT_VIEWS_TOTAL.with_label_values(&["post"]).inc();

        Ok(Post {
            views: post.views + 1,
            ..post
        })
    }

    /// Update a post's description; only the owner may edit.
    pub async fn update_post(
        &self,
        actor: &User,
        id: &str,
        description: &str,
    ) -> Result<Post, AppError> {
        let post = self
            .db
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        if post.user_id.as_deref() != Some(actor.id.as_str()) {
            return Err(AppError::Forbidden(
                "You can't edit someone else's post".to_string(),
            ));
        }

        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }

        self.db
            .update_post_description(&post.id, description, Utc::now())
            .await?;

        self.db
            .get_post(&post.id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    /// Soft-delete a post; only the owner may delete.
    pub async fn delete_post(&self, actor: &User, id: &str) -> Result<(), AppError> {
        let post = self
            .db
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        if post.user_id.as_deref() != Some(actor.id.as_str()) {
            return Err(AppError::Forbidden(
                "You can't delete someone else's post".to_string(),
            ));
        }

        if !self.db.soft_delete_post(&post.id).await? {
            return Err(AppError::not_found("Post"));
        }
        Ok(())
    }

    // =========================================================================
    // Stories
    // =========================================================================

    /// Create a story; shares the extraction pipeline with posts.
    pub async fn create_story(&self, actor: &User, input: StoryInput) -> Result<Story, AppError> {
        let description = input.description.trim().to_string();
        if description.is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }

        let extraction = extract_tags_and_mentions(&description);
        let mark_user_ids = self.resolve_mentions(&extraction.mentions).await?;

        let story = Story {
            id: EntityId::new().0,
            user_id: Some(actor.id.clone()),
            description,
            photo_url: input.photo_url,
            video_url: input.video_url,
            views: 0,
            is_deleted: false,
            created_at: Utc::now(),
        };

        self.db
            .insert_story_bundle(&story, &extraction.tags, &mark_user_ids)
            .await?;

        Ok(story)
    }

    /// Fetch a story and count the view.
    pub async fn view_story(&self, id: &str) -> Result<Story, AppError> {
        let story = self
            .db
            .get_story(id)
            .await?
            .ok_or_else(|| AppError::not_found("Story"))?;

        self.db.increment_story_views(&story.id).await?;
        CONTENT_VIEWS_TOTAL.with_label_values(&["story"]).inc();

        Ok(Story {
            views: story.views + 1,
            ..story
        })
    }

    /// Update a story's editable fields; only the owner may edit.
    pub async fn update_story(
        &self,
        actor: &User,
        id: &str,
        description: Option<&str>,
        photo_url: Option<&str>,
        video_url: Option<&str>,
    ) -> Result<Story, AppError> {
        let story = self
            .db
            .get_story(id)
            .await?
            .ok_or_else(|| AppError::not_found("Story"))?;

        if story.user_id.as_deref() != Some(actor.id.as_str()) {
            return Err(AppError::Forbidden(
                "You can't edit someone else's story".to_string(),
            ));
        }

        if let Some(description) = description {
            if description.trim().is_empty() {
                return Err(AppError::Validation("Description is required".to_string()));
            }
        }

        self.db
            .update_story(&story.id, description.map(str::trim), photo_url, video_url)
            .await?;

        self.db
            .get_story(&story.id)
            .await?
            .ok_or_else(|| AppError::not_found("Story"))
    }

    /// Soft-delete a story; only the owner may delete.
    pub async fn delete_story(&self, actor: &User, id: &str) -> Result<(), AppError> {
        let story = self
            .db
            .get_story(id)
            .await?
            .ok_or_else(|| AppError::not_found("Story"))?;

        if story.user_id.as_deref() != Some(actor.id.as_str()) {
            return Err(AppError::Forbidden(
                "You can't delete someone else's story".to_string(),
            ));
        }

        if !self.db.soft_delete_story(&story.id).await? {
            return Err(AppError::not_found("Story"));
        }
        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Comment on a post.
    pub async fn create_comment(
        &self,
        actor: &User,
        post_id: &str,
        body: &str,
    ) -> Result<Comment, AppError> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::Validation("Comment body is required".to_string()));
        }

        let comment = Comment {
            id: EntityId::new().0,
            post_id: post.id,
            user_id: actor.id.clone(),
            body: body.to_string(),
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.db.insert_comment(&comment).await?;

        Ok(comment)
    }

    /// Update a comment's body; only the author may edit.
    pub async fn update_comment(
        &self,
        actor: &User,
        id: &str,
        body: &str,
    ) -> Result<Comment, AppError> {
        let comment = self
            .db
            .get_comment(id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if comment.user_id != actor.id {
            return Err(AppError::Forbidden(
                "You can't edit someone else's comment".to_string(),
            ));
        }

        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::Validation("Comment body is required".to_string()));
        }

        self.db.update_comment_body(&comment.id, body).await?;

        self.db
            .get_comment(&comment.id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))
    }

    /// Soft-delete a comment; only the author may delete.
    pub async fn delete_comment(&self, actor: &User, id: &str) -> Result<(), AppError> {
        let comment = self
            .db
            .get_comment(id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if comment.user_id != actor.id {
            return Err(AppError::Forbidden(
                "You can't delete someone else's comment".to_string(),
            ));
        }

        if !self.db.soft_delete_comment(&comment.id).await? {
            return Err(AppError::not_found("Comment"));
        }
        Ok(())
    }

    // =========================================================================
    // Like toggles
    // =========================================================================

    /// Toggle the actor's like on a post, story or comment.
    ///
    /// The target must exist and not be soft-deleted. Liking your own
    /// content is allowed.
    pub async fn toggle_like(
        &self,
        actor: &User,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<LikeToggle, AppError> {
        let exists = match target {
            LikeTarget::Post => self.db.get_post(target_id).await?.is_some(),
            LikeTarget::Story => self.db.get_story(target_id).await?.is_some(),
            LikeTarget::Comment => self.db.get_comment(target_id).await?.is_some(),
        };
        if !exists {
            return Err(AppError::not_found(match target {
                LikeTarget::Post => "Post",
                LikeTarget::Story => "Story",
                LikeTarget::Comment => "Comment",
            }));
        }

        if let Some(existing) = self.db.get_like(target, &actor.id, target_id).await? {
            self.db.delete_like(target, &existing.id).await?;
            TOGGLES_TOTAL
                .with_label_values(&[target.as_str(), "removed"])
                .inc();
            return Ok(LikeToggle::Removed);
        }

        let like = Like {
            id: EntityId::new().0,
            user_id: actor.id.clone(),
            target_id: target_id.to_string(),
            created_at: Utc::now(),
        };
        self.db.insert_like(target, &like).await?;
        TOGGLES_TOTAL
            .with_label_values(&[target.as_str(), "added"])
            .inc();

        Ok(LikeToggle::Added(LikeWithUser {
            id: like.id,
            user_id: actor.id.clone(),
            username: actor.username.clone(),
        }))
    }
}
