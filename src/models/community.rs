use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 社区。`id` 来自身份提供方的组织 ID，本服务只负责镜像其档案
/// 并维护 `prompts` 反向索引。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    #[serde(with = "crate::utils::serde_helpers::thing_id")]
    pub id: String,
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub created_by: String,
    pub members: Vec<String>,
    /// Back-index of top-level prompts posted to this community.
    pub prompts: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Community {
    pub fn new(id: String, username: String, name: String, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            name,
            bio: None,
            image_url: None,
            members: vec![created_by.clone()],
            created_by,
            prompts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertCommunityRequest {
    #[validate(
        length(min = 3, max = 30),
        custom = "crate::utils::validation::username_charset"
    )]
    pub username: String,

    #[validate(length(min = 1, max = 50))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub bio: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CommunityQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}
