use crate::{
    error::{AppError, Result},
    models::prompt::{CreateCommentRequest, CreatePromptRequest, PromptQuery},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_prompts).post(create_prompt))
        .route("/:id", get(get_prompt).delete(delete_prompt))
        .route("/:id/comments", post(add_comment))
}

#[derive(Debug, Deserialize, Default)]
struct DeleteQuery {
    /// Rendered page to invalidate after the delete.
    path: Option<String>,
}

/// 获取信息流（分页的顶层 Prompt 列表）
/// GET /api/feed/prompts
async fn list_prompts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PromptQuery>,
) -> Result<Json<Value>> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or_else(|| state.page_size());

    let feed = state.prompt_service.fetch_prompts(page, limit).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "prompts": feed.prompts,
            "pagination": {
                "current_page": feed.page,
                "items_per_page": feed.per_page,
                "total_items": feed.total,
                "is_next": feed.is_next,
            }
        }
    })))
}

/// 发布新的 Prompt
/// POST /api/feed/prompts
async fn create_prompt(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<CreatePromptRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let prompt = state.prompt_service.create_prompt(&user.id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": prompt
    })))
}

/// Prompt 详情（含两层回复）
/// GET /api/feed/prompts/:id
async fn get_prompt(
    State(state): State<Arc<AppState>>,
    Path(prompt_id): Path<String>,
) -> Result<Json<Value>> {
    let prompt = state.prompt_service.fetch_prompt_by_id(&prompt_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": prompt
    })))
}

/// 级联删除 Prompt 及其全部回复
/// DELETE /api/feed/prompts/:id
async fn delete_prompt(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(prompt_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>> {
    user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state
        .prompt_service
        .delete_prompt(&prompt_id, query.path.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Prompt deleted successfully"
    })))
}

/// 回复 Prompt
/// POST /api/feed/prompts/:id/comments
async fn add_comment(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(prompt_id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let comment = state
        .prompt_service
        .add_comment(&prompt_id, &user.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": comment
    })))
}
