//! Handlers for `/users` endpoints, including the follow graph.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/users` | Register; body [`RegisterBody`]; no auth |
//! | `GET`    | `/users/me` | The authenticated caller |
//! | `PATCH`  | `/users/me` | Body: [`UserPatch`] |
//! | `DELETE` | `/users/me` | Soft-deletes the account |
//! | `GET`    | `/users/:id` | 404 if absent or deleted |
//! | `GET`    | `/users/:id/posts` | Filtered by the caller's visibility |
//! | `POST`   | `/users/:id/follow` | Idempotent |
//! | `DELETE` | `/users/:id/follow` | 404 if not following |
//! | `GET`    | `/users/:id/followers` | Paged |
//! | `GET`    | `/users/:id/following` | Paged |

use std::sync::Arc;

use agora_core::{
  engagement::PostView,
  follow::Follow,
  store::SocialStore,
  user::{NewUser, User, UserPatch},
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
  auth::{CurrentUser, MaybeUser, hash_password},
  error::ApiError,
  pagination::PageParams,
};

// ─── Account ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:        String,
  pub username:     String,
  pub password:     String,
  pub display_name: Option<String>,
}

/// `POST /users` — returns 201 + the new [`User`].
pub async fn register<S: SocialStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password is required".into()));
  }
  let user = store
    .register_user(NewUser {
      email:         body.email.trim().to_owned(),
      username:      body.username.trim().to_owned(),
      password_hash: hash_password(&body.password)?,
      display_name:  body.display_name,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> { Json(user) }

/// `PATCH /users/me`
pub async fn update_me<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Json(patch): Json<UserPatch>,
) -> Result<Json<User>, ApiError> {
  let user = store
    .update_user(user.user_id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(user))
}

/// `DELETE /users/me`
pub async fn delete_me<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
  store.delete_user(user.user_id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/:id`
pub async fn get_one<S: SocialStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
  let user = store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
  Ok(Json(user))
}

/// `GET /users/:id/posts`
pub async fn posts<S: SocialStore>(
  State(store): State<Arc<S>>,
  viewer: MaybeUser,
  Path(id): Path<Uuid>,
  Query(params): Query<PageParams>,
) -> Result<Json<Vec<PostView>>, ApiError> {
  let posts = store
    .list_author_posts(id, viewer.id(), params.page()?)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(posts))
}

// ─── Follow graph ─────────────────────────────────────────────────────────────

/// `POST /users/:id/follow`
pub async fn follow<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Follow>, ApiError> {
  let edge = store
    .follow(user.user_id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(edge))
}

/// `DELETE /users/:id/follow`
pub async fn unfollow<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .unfollow(user.user_id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/:id/followers`
pub async fn followers<S: SocialStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<PageParams>,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = store
    .list_followers(id, params.page()?)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(users))
}

/// `GET /users/:id/following`
pub async fn following<S: SocialStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<PageParams>,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = store
    .list_following(id, params.page()?)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(users))
}
