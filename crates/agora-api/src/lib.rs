//! JSON REST API for Agora.
//!
//! Exposes an axum [`Router`] backed by any [`agora_core::store::SocialStore`].
//! Callers authenticate with HTTP Basic against the store's password hashes;
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", agora_api::api_router(store.clone()))
//! ```

pub mod auth;
pub mod chats;
pub mod engagement;
pub mod error;
pub mod notifications;
pub mod pagination;
pub mod posts;
pub mod users;

use std::sync::Arc;

use agora_core::store::SocialStore;
use axum::{
  Json, Router,
  routing::{delete, get, post, put},
};
use serde_json::{Value, json};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SocialStore + 'static,
{
  Router::<Arc<S>>::new()
    .route("/health", get(health))
    // Users and the follow graph
    .route("/users", post(users::register::<S>))
    .route(
      "/users/me",
      get(users::me)
        .patch(users::update_me::<S>)
        .delete(users::delete_me::<S>),
    )
    .route("/users/{id}", get(users::get_one::<S>))
    .route("/users/{id}/posts", get(users::posts::<S>))
    .route(
      "/users/{id}/follow",
      post(users::follow::<S>).delete(users::unfollow::<S>),
    )
    .route("/users/{id}/followers", get(users::followers::<S>))
    .route("/users/{id}/following", get(users::following::<S>))
    // Posts and feeds
    .route("/posts", get(posts::list::<S>).post(posts::create::<S>))
    .route(
      "/posts/{id}",
      get(posts::get_one::<S>)
        .patch(posts::update::<S>)
        .delete(posts::delete::<S>),
    )
    .route("/feed", get(posts::feed::<S>))
    // Comments and reactions
    .route(
      "/posts/{id}/comments",
      get(engagement::list_comments::<S>).post(engagement::add_comment::<S>),
    )
    .route("/comments/{id}", delete(engagement::delete_comment::<S>))
    .route(
      "/posts/{id}/reaction",
      put(engagement::set_reaction::<S>).delete(engagement::remove_reaction::<S>),
    )
    // Chats
    .route("/chats", get(chats::list::<S>).post(chats::create::<S>))
    .route("/chats/{id}", get(chats::get_one::<S>).patch(chats::update::<S>))
    .route("/chats/{id}/participants", post(chats::add_participant::<S>))
    .route(
      "/chats/{id}/participants/{user_id}",
      delete(chats::remove_participant::<S>),
    )
    .route(
      "/chats/{id}/messages",
      get(chats::list_messages::<S>).post(chats::send_message::<S>),
    )
    .route(
      "/chats/{id}/messages/{message_id}",
      delete(chats::delete_message::<S>),
    )
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/read-all", post(notifications::mark_all_read::<S>))
    .route("/notifications/{id}/read", post(notifications::mark_read::<S>))
    .with_state(store)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests;
