use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::AppState;

pub async fn list_my_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl axum::response::IntoResponse> {
    let user_id = claims.user_id()?;
    let notifications = state.notification_service.list_for_user(user_id).await?;
    Ok(Json(notifications))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl axum::response::IntoResponse> {
    let user_id = claims.user_id()?;
    state.notification_service.mark_all_read(user_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "All notifications marked as read.",
    })))
}

pub async fn mark_one_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let user_id = claims.user_id()?;
    let notification = state
        .notification_service
        .mark_read(user_id, notification_id)
        .await?;
    Ok(Json(notification))
}
