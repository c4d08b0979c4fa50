use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 用户档案。`id` 是身份提供方颁发的用户 ID，服务端只把它当作
/// 已验证的外键使用，不做任何认证。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(with = "crate::utils::serde_helpers::thing_id")]
    pub id: String,
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub onboarded: bool,
    /// Back-index of top-level prompts authored by this user.
    pub prompts: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: String, username: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            name,
            bio: None,
            image_url: None,
            onboarded: false,
            prompts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertUserRequest {
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
