//! Handlers for `/notifications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notifications` | Newest first; optional `?unread_only=true` |
//! | `POST` | `/notifications/:id/read` | 404 unless owned by the caller |
//! | `POST` | `/notifications/read-all` | Returns `{"updated": <n>}` |

use std::sync::Arc;

use agora_core::{notification::Notification, store::SocialStore};
use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{auth::CurrentUser, error::ApiError, pagination::to_page};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:        Option<u32>,
  pub page_size:   Option<u32>,
  #[serde(default)]
  pub unread_only: bool,
}

/// `GET /notifications[?unread_only=true]`
pub async fn list<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, ApiError> {
  let page = to_page(params.page, params.page_size)?;
  let notifications = store
    .list_notifications(user.user_id, page, params.unread_only)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notifications))
}

/// `POST /notifications/:id/read`
pub async fn mark_read<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
  let notification = store
    .mark_notification_read(id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notification))
}

/// `POST /notifications/read-all`
pub async fn mark_all_read<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
  let updated = store
    .mark_all_notifications_read(user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "updated": updated })))
}
