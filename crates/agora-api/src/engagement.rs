//! Handlers for comments and reactions on posts.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/posts/:id/comments` | Oldest first; 404 if the post is hidden |
//! | `POST`   | `/posts/:id/comments` | Body: `{"content":"..."}`; returns 201 |
//! | `DELETE` | `/comments/:id` | Comment author or post author |
//! | `PUT`    | `/posts/:id/reaction` | Body: `{"kind":"like"}`; replaces any earlier reaction |
//! | `DELETE` | `/posts/:id/reaction` | 404 if the caller has not reacted |

use std::sync::Arc;

use agora_core::{
  engagement::{Comment, Reaction, ReactionKind},
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
  pagination::PageParams,
};

// ─── Comments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub content: String,
}

/// `GET /posts/:id/comments`
pub async fn list_comments<S: SocialStore>(
  State(store): State<Arc<S>>,
  viewer: MaybeUser,
  Path(post_id): Path<Uuid>,
  Query(params): Query<PageParams>,
) -> Result<Json<Vec<Comment>>, ApiError> {
  let comments = store
    .list_comments(post_id, viewer.id(), params.page()?)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(comments))
}

/// `POST /posts/:id/comments` — returns 201 + the stored [`Comment`].
pub async fn add_comment<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(post_id): Path<Uuid>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let comment = store
    .add_comment(post_id, user.user_id, body.content)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `DELETE /comments/:id`
pub async fn delete_comment<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(comment_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .delete_comment(comment_id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Reactions ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReactionBody {
  pub kind: ReactionKind,
}

/// `PUT /posts/:id/reaction`
pub async fn set_reaction<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(post_id): Path<Uuid>,
  Json(body): Json<ReactionBody>,
) -> Result<Json<Reaction>, ApiError> {
  let reaction = store
    .set_reaction(post_id, user.user_id, body.kind)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(reaction))
}

/// `DELETE /posts/:id/reaction`
pub async fn remove_reaction<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(post_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .remove_reaction(post_id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
