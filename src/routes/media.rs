use crate::{
    error::{AppError, Result},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Multipart, State},
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/upload", post(upload_image))
}

/// 上传图片，返回托管后的 URL
/// POST /api/feed/media/upload
async fn upload_image(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::FileUpload(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::FileUpload(e.to_string()))?
            .to_vec();

        let url = state
            .media_service
            .upload_image(&file_name, &content_type, data)
            .await?;

        return Ok(Json(json!({
            "success": true,
            "data": { "url": url }
        })));
    }

    Err(AppError::FileUpload("Missing file field".to_string()))
}
