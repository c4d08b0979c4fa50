use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, Router},
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prompt_share::{
    config::Config,
    routes,
    services::{
        AuthService, CommunityService, Database, MediaService, PromptService,
        RevalidationService, UserService,
    },
    state::AppState,
    utils,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "prompt_share=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PromptShare service...");

    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    info!("Starting in {} mode", config.environment);

    if config.is_production() && config.cors_allowed_origins.contains("localhost") {
        tracing::warn!("Production environment is allowing localhost CORS origins");
    }

    // 初始化数据库连接
    let db = Database::connect(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Database initialization failed: {}", e))?;
    db.verify_connection()
        .await
        .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;
    info!("Database connection established successfully");
    let db = Arc::new(db);

    // 初始化所有服务
    let auth_service = AuthService::new(&config).await?;
    let revalidation_service = RevalidationService::new(&config).await?;
    let prompt_service = PromptService::new(db.clone(), revalidation_service.clone()).await?;
    let user_service = UserService::new(db.clone()).await?;
    let community_service = CommunityService::new(db.clone()).await?;
    let media_service = MediaService::new(&config).await?;

    // 创建应用状态
    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: (*db).clone(),
        auth_service,
        prompt_service,
        user_service,
        community_service,
        media_service,
        revalidation_service,
    });

    // 配置 CORS
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(
            config
                .cors_allowed_origins
                .split(',')
                .map(|origin| origin.parse::<HeaderValue>().unwrap())
                .collect::<Vec<_>>(),
        );

    // 构建应用路由 - 使用/api/feed/前缀避免网关路由冲突
    let app = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api/feed/prompts", routes::prompts::router())
        .nest("/api/feed/users", routes::users::router())
        .nest("/api/feed/communities", routes::communities::router())
        .nest("/api/feed/media", routes::media::router())
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            utils::middleware::auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            utils::middleware::rate_limit_middleware,
        ))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "PromptShare is running!"
}
