use crate::{
    config::Config,
    services::{
        auth::AuthService, community::CommunityService, database::Database, media::MediaService,
        prompt::PromptService, revalidate::RevalidationService, user::UserService,
    },
};

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Database,

    /// 认证服务
    pub auth_service: AuthService,

    /// Prompt 树存储
    pub prompt_service: PromptService,

    /// 用户服务
    pub user_service: UserService,

    /// 社区服务
    pub community_service: CommunityService,

    /// 媒体服务
    pub media_service: MediaService,

    /// 缓存失效通知服务
    pub revalidation_service: RevalidationService,
}

impl AppState {
    /// 获取默认分页大小
    pub fn page_size(&self) -> usize {
        self.config.default_prompts_per_page
    }
}
