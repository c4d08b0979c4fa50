use crate::{
    error::{AppError, Result},
    models::user::UpsertUserRequest,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id", get(get_user).post(upsert_user))
        .route("/:id/prompts", get(get_user_prompts))
}

/// 用户档案
/// GET /api/feed/users/:id
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    let user = state
        .user_service
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(json!({
        "success": true,
        "data": user
    })))
}

/// 创建/更新用户档案（onboarding）
/// POST /api/feed/users/:id
async fn upsert_user(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(user_id): Path<String>,
    Json(request): Json<UpsertUserRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    if user.id != user_id {
        return Err(AppError::forbidden("You can only update your own profile"));
    }

    let profile = state.user_service.upsert_user(&user_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile
    })))
}

/// 用户发布过的顶层 Prompt
/// GET /api/feed/users/:id/prompts
async fn get_user_prompts(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    let prompts = state.prompt_service.fetch_user_prompts(&user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": prompts
    })))
}
