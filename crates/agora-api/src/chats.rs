//! Handlers for `/chats` endpoints. Every route requires authentication;
//! callers who are not active participants get 403.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/chats` | Caller's chats, most recent activity first |
//! | `POST`   | `/chats` | Body: [`CreateBody`]; 201, or 200 when a direct chat with the partner already exists |
//! | `GET`    | `/chats/:id` | Chat + active participants |
//! | `PATCH`  | `/chats/:id` | Body: `{"title":"..."}`; `null` clears, a missing field is 400 |
//! | `POST`   | `/chats/:id/participants` | Body: `{"user_id":"..."}` |
//! | `DELETE` | `/chats/:id/participants/:user_id` | Leave (own id) or remove |
//! | `GET`    | `/chats/:id/messages` | Newest first; optional `?before=<rfc3339>` |
//! | `POST`   | `/chats/:id/messages` | Body: [`NewMessage`]; returns 201 |
//! | `DELETE` | `/chats/:id/messages/:message_id` | Sender only |

use std::sync::Arc;

use agora_core::{
  chat::{self, Chat, ChatDetail, ChatKind, Message, NewMessage, Participant},
  store::SocialStore,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::{
  auth::CurrentUser,
  error::ApiError,
  pagination::{PageParams, to_page},
};

// ─── Chats ────────────────────────────────────────────────────────────────────

/// `GET /chats`
pub async fn list<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<PageParams>,
) -> Result<Json<Vec<Chat>>, ApiError> {
  let chats = store
    .list_chats(user.user_id, params.page()?)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(chats))
}

/// Body of `POST /chats`. A direct chat lists exactly one other user and
/// carries no title.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub kind:            ChatKind,
  pub title:           Option<String>,
  #[serde(default)]
  pub participant_ids: Vec<Uuid>,
}

/// `POST /chats`: [`ChatDetail`] with 201 for a new chat, 200 for an existing
/// direct chat.
pub async fn create<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let (detail, created) = match body.kind {
    ChatKind::Direct => {
      if body.title.is_some() {
        return Err(ApiError::BadRequest("direct chats have no title".into()));
      }
      let other = chat::direct_counterpart(user.user_id, &body.participant_ids)?;
      store.create_direct_chat(user.user_id, other).await
    }
    ChatKind::Group => store
      .create_group_chat(user.user_id, body.title, body.participant_ids)
      .await
      .map(|detail| (detail, true)),
  }
  .map_err(ApiError::store)?;
  let status = if created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(detail)))
}

/// `GET /chats/:id`
pub async fn get_one<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(chat_id): Path<Uuid>,
) -> Result<Json<ChatDetail>, ApiError> {
  let detail = store
    .get_chat(chat_id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(detail))
}

/// Body of `PATCH /chats/:id`. `title` must be present; `null` clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(default, deserialize_with = "present")]
  pub title: Option<Option<String>>,
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
  D: Deserializer<'de>,
{
  Option::<String>::deserialize(deserializer).map(Some)
}

/// `PATCH /chats/:id`
pub async fn update<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(chat_id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Chat>, ApiError> {
  let title = body
    .title
    .ok_or_else(|| ApiError::BadRequest("title is required".into()))?;
  let chat = store
    .update_chat(chat_id, user.user_id, title)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(chat))
}

// ─── Participants ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddParticipantBody {
  pub user_id: Uuid,
}

/// `POST /chats/:id/participants`
pub async fn add_participant<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(chat_id): Path<Uuid>,
  Json(body): Json<AddParticipantBody>,
) -> Result<Json<Participant>, ApiError> {
  let participant = store
    .add_participant(chat_id, user.user_id, body.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(participant))
}

/// `DELETE /chats/:id/participants/:user_id`
pub async fn remove_participant<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path((chat_id, target)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  store
    .remove_participant(chat_id, user.user_id, target)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Messages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessageParams {
  pub page:      Option<u32>,
  pub page_size: Option<u32>,
  /// Only messages created strictly before this instant.
  pub before:    Option<DateTime<Utc>>,
}

/// `GET /chats/:id/messages[?before=<rfc3339>]`
pub async fn list_messages<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(chat_id): Path<Uuid>,
  Query(params): Query<MessageParams>,
) -> Result<Json<Vec<Message>>, ApiError> {
  let page = to_page(params.page, params.page_size)?;
  let messages = store
    .list_messages(chat_id, user.user_id, page, params.before)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(messages))
}

/// `POST /chats/:id/messages` — returns 201 + the stored [`Message`].
pub async fn send_message<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(chat_id): Path<Uuid>,
  Json(body): Json<NewMessage>,
) -> Result<impl IntoResponse, ApiError> {
  let message = store
    .send_message(chat_id, user.user_id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(message)))
}

/// `DELETE /chats/:id/messages/:message_id`
pub async fn delete_message<S: SocialStore>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path((chat_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  store
    .delete_message(chat_id, message_id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
