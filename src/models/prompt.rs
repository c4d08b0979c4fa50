use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{community::Community, user::User};

/// A prompt is either a top-level post (`parent_id` is `None`) or a
/// reply to another prompt. The tree is encoded solely by `parent_id`;
/// replies are derived by query, never stored on the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(with = "crate::utils::serde_helpers::thing_id")]
    pub id: String,
    pub text: String,
    pub code: Option<String>,
    pub image_url: Option<String>,
    pub author_id: String,
    pub community_id: Option<String>,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Prompt {
    pub fn new(text: String, author_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            code: None,
            image_url: None,
            author_id,
            community_id: None,
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePromptRequest {
    #[validate(length(min = 3, max = 10000, message = "Minimum 3 characters."))]
    pub text: String,

    #[validate(length(max = 10000))]
    pub code: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,

    pub community_id: Option<String>,

    /// Rendered page to invalidate after the write.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 3, max = 10000, message = "Minimum 3 characters."))]
    pub text: String,

    #[validate(length(max = 10000))]
    pub code: Option<String>,

    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub id: String,
    pub username: String,
    pub name: String,
    pub image_url: Option<String>,
}

impl AuthorInfo {
    /// Placeholder for authors that never finished onboarding or whose
    /// profile record is missing.
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }
}

impl From<&User> for AuthorInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            image_url: user.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityInfo {
    pub id: String,
    pub username: String,
    pub name: String,
    pub image_url: Option<String>,
}

impl From<&Community> for CommunityInfo {
    fn from(community: &Community) -> Self {
        Self {
            id: community.id.clone(),
            username: community.username.clone(),
            name: community.name.clone(),
            image_url: community.image_url.clone(),
        }
    }
}

/// A reply resolved with its author. `replies` is filled one more level
/// down on the detail view and left empty beyond that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptReply {
    #[serde(flatten)]
    pub prompt: Prompt,
    pub author: AuthorInfo,
    pub replies: Vec<PromptReply>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResponse {
    #[serde(flatten)]
    pub prompt: Prompt,
    pub author: AuthorInfo,
    pub community: Option<CommunityInfo>,
    pub replies: Vec<PromptReply>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptFeed {
    pub prompts: Vec<PromptResponse>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub is_next: bool,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct PromptQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_new_prompt_is_top_level() {
        let prompt = Prompt::new("Write a haiku about borrow checking".to_string(), "user_1".to_string());
        assert!(prompt.is_top_level());
        assert!(prompt.code.is_none());
        assert!(prompt.community_id.is_none());
        assert!(!prompt.id.is_empty());
    }

    #[test]
    fn test_create_prompt_request_bounds() {
        let valid = CreatePromptRequest {
            text: "A prompt worth sharing".to_string(),
            code: None,
            image_url: None,
            community_id: None,
            path: None,
        };
        assert!(valid.validate().is_ok());

        let too_short = CreatePromptRequest {
            text: "ab".to_string(),
            code: None,
            image_url: None,
            community_id: None,
            path: None,
        };
        assert!(too_short.validate().is_err());

        let bad_url = CreatePromptRequest {
            text: "A prompt worth sharing".to_string(),
            code: None,
            image_url: Some("not a url".to_string()),
            community_id: None,
            path: None,
        };
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_create_comment_request_bounds() {
        let valid = CreateCommentRequest {
            text: "Nice one".to_string(),
            code: None,
            path: None,
        };
        assert!(valid.validate().is_ok());

        let too_short = CreateCommentRequest {
            text: "no".to_string(),
            code: None,
            path: None,
        };
        assert!(too_short.validate().is_err());
    }
}
