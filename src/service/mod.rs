//! Business logic
//!
//! Services own validation and the mutation flows; handlers translate
//! HTTP to service calls and build response shapes.

mod account;
mod content;

pub use account::{AccountService, FollowToggle, Identifier, ProfileUpdate, RegisterInput};
pub use content::{
    ContentService, Extraction, LikeToggle, PostInput, StoryInput, extract_tags_and_mentions,
};
