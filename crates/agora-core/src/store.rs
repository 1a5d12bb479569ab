//! The `SocialStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `agora-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.
//!
//! Every method is one unit of work: it either commits all of its writes or
//! none of them. Domain failures surface as [`crate::Error`] inside the
//! backend's error type and are recoverable through [`DomainError`].

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  chat::{Chat, ChatDetail, Message, NewMessage, Participant},
  engagement::{Comment, Engagement, PostView, Reaction, ReactionKind},
  error::DomainError,
  follow::Follow,
  notification::Notification,
  page::Page,
  post::{NewPost, Post, PostPatch},
  user::{NewUser, User, UserPatch},
};

/// Abstraction over an Agora storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SocialStore: Send + Sync {
  type Error: DomainError;

  // ── Identity ──────────────────────────────────────────────────────────

  /// Create an account. Email and username must be unused by live accounts.
  fn register_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a live user by UUID. Returns `None` if absent or deleted.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a live user and their stored password hash by username.
  fn get_credentials(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<(User, String)>, Self::Error>> + Send + '_;

  fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Soft-delete an account. Its posts disappear from every read path.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  fn create_post(
    &self,
    author_id: Uuid,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Fetch a post if `viewer` may see it. Hidden and missing posts are both
  /// `None`.
  fn get_post(
    &self,
    post_id: Uuid,
    viewer: Option<Uuid>,
  ) -> impl Future<Output = Result<Option<PostView>, Self::Error>> + Send + '_;

  /// Author-only edit.
  fn update_post(
    &self,
    post_id: Uuid,
    caller: Uuid,
    patch: PostPatch,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Author-only soft delete.
  fn delete_post(
    &self,
    post_id: Uuid,
    caller: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Feeds ─────────────────────────────────────────────────────────────

  /// Public posts, newest first, optionally filtered by a content substring.
  /// `viewer` only drives the `liked` flag.
  fn list_public_posts(
    &self,
    page: Page,
    query: Option<String>,
    viewer: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<PostView>, Self::Error>> + Send + '_;

  /// One author's posts, newest first, filtered to what `viewer` may see.
  fn list_author_posts(
    &self,
    author_id: Uuid,
    viewer: Option<Uuid>,
    page: Page,
  ) -> impl Future<Output = Result<Vec<PostView>, Self::Error>> + Send + '_;

  /// Public and followers-only posts of everyone `viewer` follows, newest
  /// first. The viewer's own posts are not included.
  fn list_feed(
    &self,
    viewer: Uuid,
    page: Page,
  ) -> impl Future<Output = Result<Vec<PostView>, Self::Error>> + Send + '_;

  /// Reaction counts, comment counts and the viewer's liked set for a batch
  /// of posts, in a constant number of queries.
  fn batch_engagement(
    &self,
    post_ids: Vec<Uuid>,
    viewer: Option<Uuid>,
  ) -> impl Future<Output = Result<Engagement, Self::Error>> + Send + '_;

  // ── Comments and reactions ────────────────────────────────────────────

  fn add_comment(
    &self,
    post_id: Uuid,
    author_id: Uuid,
    content: String,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments on a visible post, oldest first.
  fn list_comments(
    &self,
    post_id: Uuid,
    viewer: Option<Uuid>,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Allowed for the comment's author and the post's author.
  fn delete_comment(
    &self,
    comment_id: Uuid,
    caller: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Set (or change) the caller's single reaction to a post.
  fn set_reaction(
    &self,
    post_id: Uuid,
    user_id: Uuid,
    kind: ReactionKind,
  ) -> impl Future<Output = Result<Reaction, Self::Error>> + Send + '_;

  fn remove_reaction(
    &self,
    post_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Relationship graph ────────────────────────────────────────────────

  /// Idempotent: an existing live edge is returned unchanged and a deleted
  /// one is resurrected.
  fn follow(
    &self,
    follower_id: Uuid,
    followee_id: Uuid,
  ) -> impl Future<Output = Result<Follow, Self::Error>> + Send + '_;

  fn unfollow(
    &self,
    follower_id: Uuid,
    followee_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_followers(
    &self,
    user_id: Uuid,
    page: Page,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn list_following(
    &self,
    user_id: Uuid,
    page: Page,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  // ── Chats ─────────────────────────────────────────────────────────────

  /// Returns the existing live direct chat between the pair, if any. The
  /// flag is `true` only when a new chat was created.
  fn create_direct_chat(
    &self,
    creator_id: Uuid,
    other_id: Uuid,
  ) -> impl Future<Output = Result<(ChatDetail, bool), Self::Error>> + Send + '_;

  fn create_group_chat(
    &self,
    creator_id: Uuid,
    title: Option<String>,
    participant_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<ChatDetail, Self::Error>> + Send + '_;

  fn get_chat(
    &self,
    chat_id: Uuid,
    caller: Uuid,
  ) -> impl Future<Output = Result<ChatDetail, Self::Error>> + Send + '_;

  /// Chats the user is active in, most recent activity first.
  fn list_chats(
    &self,
    user_id: Uuid,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Chat>, Self::Error>> + Send + '_;

  fn update_chat(
    &self,
    chat_id: Uuid,
    caller: Uuid,
    title: Option<String>,
  ) -> impl Future<Output = Result<Chat, Self::Error>> + Send + '_;

  fn add_participant(
    &self,
    chat_id: Uuid,
    caller: Uuid,
    target: Uuid,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  fn remove_participant(
    &self,
    chat_id: Uuid,
    caller: Uuid,
    target: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn send_message(
    &self,
    chat_id: Uuid,
    sender_id: Uuid,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Newest first; `before` restricts to messages created strictly earlier.
  fn list_messages(
    &self,
    chat_id: Uuid,
    caller: Uuid,
    page: Page,
    before: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  /// Sender-only soft delete.
  fn delete_message(
    &self,
    chat_id: Uuid,
    message_id: Uuid,
    caller: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  fn list_notifications(
    &self,
    user_id: Uuid,
    page: Page,
    unread_only: bool,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  fn mark_notification_read(
    &self,
    notification_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Returns the number of notifications that changed state.
  fn mark_all_notifications_read(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
