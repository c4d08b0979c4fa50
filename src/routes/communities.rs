use crate::{
    error::{AppError, Result},
    models::community::{CommunityQuery, UpsertCommunityRequest},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_communities))
        .route("/:id", get(get_community).post(upsert_community))
        .route("/:id/prompts", get(get_community_prompts))
}

/// 社区列表
/// GET /api/feed/communities
async fn list_communities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommunityQuery>,
) -> Result<Json<Value>> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or_else(|| state.page_size());

    let communities = state.community_service.list_communities(page, limit).await?;

    Ok(Json(json!({
        "success": true,
        "data": communities
    })))
}

/// 社区详情
/// GET /api/feed/communities/:id
async fn get_community(
    State(state): State<Arc<AppState>>,
    Path(community_id): Path<String>,
) -> Result<Json<Value>> {
    let community = state
        .community_service
        .get_community(&community_id)
        .await?
        .ok_or_else(|| AppError::not_found("Community"))?;

    Ok(Json(json!({
        "success": true,
        "data": community
    })))
}

/// 镜像身份提供方的组织信息
/// POST /api/feed/communities/:id
async fn upsert_community(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(community_id): Path<String>,
    Json(request): Json<UpsertCommunityRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let community = state
        .community_service
        .upsert_community(&user.id, &community_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": community
    })))
}

/// 社区内发布的顶层 Prompt
/// GET /api/feed/communities/:id/prompts
async fn get_community_prompts(
    State(state): State<Arc<AppState>>,
    Path(community_id): Path<String>,
) -> Result<Json<Value>> {
    let prompts = state
        .prompt_service
        .fetch_community_prompts(&community_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": prompts
    })))
}
