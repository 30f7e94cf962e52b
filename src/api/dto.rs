//! Response shapes
//!
//! Projections returned by the HTTP handlers. Engagement blocks on
//! content owned by a private account collapse to a placeholder
//! message for every viewer except the owner.

use serde::Serialize;

use crate::AppState;
use crate::data::{
    CommentSummary, CommentWithUser, ContentSummary, LikeTarget, LikeWithUser, MarkWithUser, Post,
    Story, User,
};
use crate::error::AppError;

/// Placeholder shown instead of engagement data on private accounts
pub const PRIVATE_ACCOUNT_MESSAGE: &str = "This account is private";

/// Descriptions are shortened in list and related-content projections.
const SUMMARY_LEN: usize = 33;

fn summarize(text: &str) -> String {
    text.chars().take(SUMMARY_LEN).collect()
}

/// An engagement block, or the privacy placeholder in its place
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Gated<T: Serialize> {
    Visible(T),
    Hidden { message: &'static str },
}

impl<T: Serialize> Gated<T> {
    fn gate(visible: bool, value: T) -> Self {
        if visible {
            Gated::Visible(value)
        } else {
            Gated::Hidden {
                message: PRIVATE_ACCOUNT_MESSAGE,
            }
        }
    }
}

/// Whether `viewer` may see engagement data on `owner`'s content.
fn can_view(owner: Option<&User>, viewer: Option<&User>) -> bool {
    match owner {
        Some(owner) if owner.is_private => viewer.is_some_and(|v| v.id == owner.id),
        _ => true,
    }
}

// =============================================================================
// Building blocks
// =============================================================================

/// Content owner, embedded in detail projections
#[derive(Debug, Clone, Serialize)]
pub struct OwnerDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
}

impl From<&User> for OwnerDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeDto {
    pub id: String,
    pub user_id: String,
    pub username: String,
}

impl From<LikeWithUser> for LikeDto {
    fn from(like: LikeWithUser) -> Self {
        Self {
            id: like.id,
            user_id: like.user_id,
            username: like.username,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LikesBlock {
    pub total: usize,
    pub users: Vec<LikeDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentDto {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub username: String,
    pub body: String,
}

impl From<CommentWithUser> for CommentDto {
    fn from(comment: CommentWithUser) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            username: comment.username,
            body: comment.body,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentsBlock {
    pub total: usize,
    pub items: Vec<CommentDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagsBlock {
    pub total: usize,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkDto {
    pub id: String,
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_description: Option<String>,
}

impl From<MarkWithUser> for MarkDto {
    fn from(mark: MarkWithUser) -> Self {
        Self {
            id: mark.id,
            user_id: mark.user_id,
            username: mark.username,
            post_id: mark.post_id,
            post_description: mark.post_description.as_deref().map(summarize),
            story_id: mark.story_id,
            story_description: mark.story_description.as_deref().map(summarize),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarksBlock {
    pub total: usize,
    pub items: Vec<MarkDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaDto {
    pub id: String,
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentSummaryDto {
    pub id: String,
    pub description: String,
}

impl From<ContentSummary> for ContentSummaryDto {
    fn from(summary: ContentSummary) -> Self {
        Self {
            id: summary.id,
            description: summarize(&summary.description),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentSummaryDto {
    pub id: String,
    pub post_id: String,
    pub post_description: String,
    pub body: String,
}

impl From<CommentSummary> for CommentSummaryDto {
    fn from(summary: CommentSummary) -> Self {
        Self {
            id: summary.id,
            post_id: summary.post_id,
            post_description: summarize(&summary.post_description),
            body: summarize(&summary.body),
        }
    }
}

// =============================================================================
// Users & profiles
// =============================================================================

/// Account representation in auth responses
#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_private: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_active: user.is_active,
            is_private: user.is_private,
            created_at: user.created_at,
        }
    }
}

/// Per-target like counts shown on a profile
#[derive(Debug, Clone, Serialize)]
pub struct LikeCounts {
    pub posts: i64,
    pub stories: i64,
    pub comments: i64,
}

/// Full profile projection
///
/// Content and engagement blocks are gated for private accounts.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub is_private: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub followers_count: usize,
    pub following_count: usize,
    pub comments_count: i64,
    /// Whether the viewer follows this account; absent for anonymous
    /// viewers and for the owner's own profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
    pub posts: Gated<Vec<ContentSummaryDto>>,
    pub stories: Gated<Vec<ContentSummaryDto>>,
    pub comments: Gated<Vec<CommentSummaryDto>>,
    pub marks: Gated<Vec<MarkDto>>,
    /// Likes this account has given, per target kind; owner only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes_given: Option<LikeCounts>,
}

/// Assemble the profile projection for one account.
pub async fn profile_dto(
    state: &AppState,
    user: &User,
    viewer: Option<&User>,
) -> Result<ProfileDto, AppError> {
    let visible = can_view(Some(user), viewer);

    let (followers, following) = futures::try_join!(
        state.db.followers_of(&user.id),
        state.db.following_of(&user.id),
    )?;

    let (posts, stories, comments, marks) = futures::try_join!(
        state.db.post_summaries_by_user(&user.id),
        state.db.story_summaries_by_user(&user.id),
        state.db.comment_summaries_by_user(&user.id),
        state.db.marks_by_user(&user.id),
    )?;
    let posts: Vec<ContentSummaryDto> = posts.into_iter().map(Into::into).collect();
    let stories: Vec<ContentSummaryDto> = stories.into_iter().map(Into::into).collect();
    let comments: Vec<CommentSummaryDto> = comments.into_iter().map(Into::into).collect();
    let marks: Vec<MarkDto> = marks.into_iter().map(Into::into).collect();

    let comments_count = state.db.count_user_comments(&user.id).await?;

    let is_following = match viewer {
        Some(v) if v.id != user.id => Some(state.db.is_following(&v.id, &user.id).await?),
        _ => None,
    };

    let likes_given = if viewer.is_some_and(|v| v.id == user.id) {
        let (post_likes, story_likes, comment_likes) = futures::try_join!(
            state.db.count_user_likes(LikeTarget::Post, &user.id),
            state.db.count_user_likes(LikeTarget::Story, &user.id),
            state.db.count_user_likes(LikeTarget::Comment, &user.id),
        )?;
        Some(LikeCounts {
            posts: post_likes,
            stories: story_likes,
            comments: comment_likes,
        })
    } else {
        None
    };

    Ok(ProfileDto {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        phone_number: user.phone_number.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_private: user.is_private,
        created_at: user.created_at,
        followers_count: followers.len(),
        following_count: following.len(),
        comments_count,
        is_following,
        posts: Gated::gate(visible, posts),
        stories: Gated::gate(visible, stories),
        comments: Gated::gate(visible, comments),
        marks: Gated::gate(visible, marks),
        likes_given,
    })
}

/// Follow edge joined with both endpoints
#[derive(Debug, Clone, Serialize)]
pub struct FollowDto {
    pub id: String,
    pub follower_id: String,
    pub follower_username: String,
    pub follower_email: String,
    pub follower_phone_number: String,
    pub followed_id: String,
    pub followed_username: String,
    pub followed_email: String,
}

impl From<crate::data::FollowWithUsers> for FollowDto {
    fn from(follow: crate::data::FollowWithUsers) -> Self {
        Self {
            id: follow.id,
            follower_id: follow.follower_id,
            follower_username: follow.follower_username,
            follower_email: follow.follower_email,
            follower_phone_number: follow.follower_phone_number,
            followed_id: follow.followed_id,
            followed_username: follow.followed_username,
            followed_email: follow.followed_email,
        }
    }
}

// =============================================================================
// Posts
// =============================================================================

/// Post detail/list projection
#[derive(Debug, Clone, Serialize)]
pub struct PostDto {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerDto>,
    pub description: String,
    pub views: i64,
    pub media: Vec<MediaDto>,
    pub is_liked: bool,
    pub tags: Gated<TagsBlock>,
    pub marks: Gated<MarksBlock>,
    pub likes: Gated<LikesBlock>,
    pub comments: Gated<CommentsBlock>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Assemble the post projection, applying the owner's privacy setting.
pub async fn post_dto(
    state: &AppState,
    post: &Post,
    viewer: Option<&User>,
) -> Result<PostDto, AppError> {
    let owner = match &post.user_id {
        Some(user_id) => state.db.get_user(user_id).await?,
        None => None,
    };
    let visible = can_view(owner.as_ref(), viewer);

    let (media, tags, marks, likes, comments) = futures::try_join!(
        state.db.media_by_post(&post.id),
        state.db.tags_by_post(&post.id),
        state.db.marks_by_post(&post.id),
        state.db.likes_by_target(LikeTarget::Post, &post.id),
        state.db.comments_by_post(&post.id, None),
    )?;

    let media: Vec<MediaDto> = media
        .into_iter()
        .map(|m| MediaDto {
            id: m.id,
            kind: m.kind,
            url: m.url,
        })
        .collect();
    let tags: Vec<String> = tags.into_iter().map(|t| t.tag).collect();
    let marks: Vec<MarkDto> = marks.into_iter().map(Into::into).collect();
    let likes: Vec<LikeDto> = likes.into_iter().map(Into::into).collect();
    let comments: Vec<CommentDto> = comments.into_iter().map(Into::into).collect();

    let is_liked = match viewer {
        Some(viewer) => {
            state
                .db
                .is_liked_by(LikeTarget::Post, &post.id, &viewer.id)
                .await?
        }
        None => false,
    };

    Ok(PostDto {
        id: post.id.clone(),
        owner: owner.as_ref().map(Into::into),
        description: post.description.clone(),
        views: post.views,
        media,
        is_liked,
        tags: Gated::gate(
            visible,
            TagsBlock {
                total: tags.len(),
                items: tags,
            },
        ),
        marks: Gated::gate(
            visible,
            MarksBlock {
                total: marks.len(),
                items: marks,
            },
        ),
        likes: Gated::gate(
            visible,
            LikesBlock {
                total: likes.len(),
                users: likes,
            },
        ),
        comments: Gated::gate(
            visible,
            CommentsBlock {
                total: comments.len(),
                items: comments,
            },
        ),
        created_at: post.created_at,
    })
}

// =============================================================================
// Stories
// =============================================================================

/// Story detail/list projection
#[derive(Debug, Clone, Serialize)]
pub struct StoryDto {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerDto>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub views: i64,
    pub is_liked: bool,
    pub tags: Gated<TagsBlock>,
    pub marks: Gated<MarksBlock>,
    pub likes: Gated<LikesBlock>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Assemble the story projection, applying the owner's privacy setting.
pub async fn story_dto(
    state: &AppState,
    story: &Story,
    viewer: Option<&User>,
) -> Result<StoryDto, AppError> {
    let owner = match &story.user_id {
        Some(user_id) => state.db.get_user(user_id).await?,
        None => None,
    };
    let visible = can_view(owner.as_ref(), viewer);

    let (tags, marks, likes) = futures::try_join!(
        state.db.tags_by_story(&story.id),
        state.db.marks_by_story(&story.id),
        state.db.likes_by_target(LikeTarget::Story, &story.id),
    )?;

    let tags: Vec<String> = tags.into_iter().map(|t| t.tag).collect();
    let marks: Vec<MarkDto> = marks.into_iter().map(Into::into).collect();
    let likes: Vec<LikeDto> = likes.into_iter().map(Into::into).collect();

    let is_liked = match viewer {
        Some(viewer) => {
            state
                .db
                .is_liked_by(LikeTarget::Story, &story.id, &viewer.id)
                .await?
        }
        None => false,
    };

    Ok(StoryDto {
        id: story.id.clone(),
        owner: owner.as_ref().map(Into::into),
        description: story.description.clone(),
        photo_url: story.photo_url.clone(),
        video_url: story.video_url.clone(),
        views: story.views,
        is_liked,
        tags: Gated::gate(
            visible,
            TagsBlock {
                total: tags.len(),
                items: tags,
            },
        ),
        marks: Gated::gate(
            visible,
            MarksBlock {
                total: marks.len(),
                items: marks,
            },
        ),
        likes: Gated::gate(
            visible,
            LikesBlock {
                total: likes.len(),
                users: likes,
            },
        ),
        created_at: story.created_at,
    })
}

// =============================================================================
// Comments
// =============================================================================

/// Comment detail projection with its like block
#[derive(Debug, Clone, Serialize)]
pub struct CommentDetailDto {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub body: String,
    pub is_liked: bool,
    pub likes: LikesBlock,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Assemble the comment detail projection.
pub async fn comment_dto(
    state: &AppState,
    comment: &crate::data::Comment,
    viewer: Option<&User>,
) -> Result<CommentDetailDto, AppError> {
    let likes: Vec<LikeDto> = state
        .db
        .likes_by_target(LikeTarget::Comment, &comment.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let is_liked = match viewer {
        Some(viewer) => {
            state
                .db
                .is_liked_by(LikeTarget::Comment, &comment.id, &viewer.id)
                .await?
        }
        None => false,
    };

    Ok(CommentDetailDto {
        id: comment.id.clone(),
        post_id: comment.post_id.clone(),
        user_id: comment.user_id.clone(),
        body: comment.body.clone(),
        is_liked,
        likes: LikesBlock {
            total: likes.len(),
            users: likes,
        },
        created_at: comment.created_at,
    })
}
