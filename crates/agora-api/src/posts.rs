//! Handlers for `/posts` and `/feed`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/posts` | Public posts; optional `?q=`, `page`, `page_size` |
//! | `POST`   | `/posts` | Body: [`NewPost`]; returns 201 |
//! | `GET`    | `/posts/:id` | 404 if absent or hidden from the caller |
//! | `PATCH`  | `/posts/:id` | Author only; body: [`PostPatch`] |
//! | `DELETE` | `/posts/:id` | Author only |
//! | `GET`    | `/feed` | Posts of everyone the caller follows |

use std::sync::Arc;

use agora_core::{
  engagement::PostView,
  post::{NewPost, Post, PostPatch},
  store::SocialStore,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  auth::{CurrentUser, MaybeUser},
  error::ApiError,
  pagination::{PageParams, to_page},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:      Option<u32>,
  pub page_size: Option<u32>,
  /// Case-sensitive substring of the post text.
  pub q:         Option<String>,
}

/// `GET /posts[?q=<text>]`
pub async fn list<S: SocialStore>(
  State(store): State<Arc<S>>,
  viewer: MaybeUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PostView>>, ApiError> {
  let page = to_page(params.page, params.page_size)?;
  let posts = store
    .list_public_posts(page, params.q, viewer.id())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(posts))
}

/// `GET /feed`
pub async fn feed<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<PageParams>,
) -> Result<Json<Vec<PostView>>, ApiError> {
  let posts = store
    .list_feed(user.user_id, params.page()?)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(posts))
}

// ─── Single post ──────────────────────────────────────────────────────────────

/// `POST /posts` — returns 201 + the stored [`Post`].
pub async fn create<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<NewPost>,
) -> Result<impl IntoResponse, ApiError> {
  let post = store
    .create_post(user.user_id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /posts/:id`
pub async fn get_one<S: SocialStore>(
  State(store): State<Arc<S>>,
  viewer: MaybeUser,
  Path(id): Path<Uuid>,
) -> Result<Json<PostView>, ApiError> {
  let post = store
    .get_post(id, viewer.id())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("post not found".into()))?;
  Ok(Json(post))
}

/// `PATCH /posts/:id`
pub async fn update<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<PostPatch>,
) -> Result<Json<Post>, ApiError> {
  let post = store
    .update_post(id, user.user_id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(post))
}

/// `DELETE /posts/:id`
pub async fn delete<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .delete_post(id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
