//! [`SqliteStore`] — the SQLite implementation of [`SocialStore`].

use std::path::Path;

use agora_core::{
  Entity, Error as CoreError,
  access::{self, AddPlan, Removal},
  chat::{self, Chat, ChatDetail, ChatKind, ChatRole, Message, NewMessage, Participant},
  engagement::{Comment, Engagement, PostView, Reaction, ReactionKind, validate_comment},
  follow::{Follow, check_follow},
  notification::{Notification, PendingNotification},
  page::Page,
  post::{NewPost, Post, PostPatch, Viewer, can_view},
  store::SocialStore,
  user::{NewUser, User, UserPatch, UserStatus},
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Result,
  schema::SCHEMA,
  uow::{UnitOfWork, not_found},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Agora store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `work` as one unit of work on the connection thread.
  pub(crate) async fn transact<T, F>(&self, work: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&UnitOfWork<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(UnitOfWork::run(conn, work)))
      .await?
  }

  /// Write notifications raised by a committed operation.
  ///
  /// Runs in its own transaction after the triggering one has committed.
  /// Failures are logged and swallowed: the operation already succeeded.
  async fn dispatch(&self, pending: Vec<PendingNotification>) {
    if pending.is_empty() {
      return;
    }
    let count = pending.len();
    let result = self
      .transact(move |uow| {
        for notification in &pending {
          uow.insert_notification(notification)?;
        }
        Ok(())
      })
      .await;
    match result {
      Ok(()) => debug!(count, "notifications dispatched"),
      Err(error) => warn!(%error, count, "dropping notifications"),
    }
  }
}

/// Attach engagement to a page of posts inside the same unit of work.
fn annotate(uow: &UnitOfWork<'_>, posts: Vec<Post>, viewer: Option<Uuid>) -> Result<Vec<PostView>> {
  let ids: Vec<Uuid> = posts.iter().map(|p| p.post_id).collect();
  let engagement = uow.engagement(&ids, viewer)?;
  Ok(engagement.annotate(posts))
}

/// Load a post the caller may see, or fail with "not found" so hidden posts
/// are indistinguishable from missing ones.
fn visible_post(uow: &UnitOfWork<'_>, post_id: Uuid, viewer: Option<Uuid>) -> Result<Post> {
  let post = uow.post(post_id)?.ok_or_else(|| not_found(Entity::Post))?;
  let follows = match viewer {
    Some(v) if v != post.author_id => uow.is_following(v, post.author_id)?,
    _ => false,
  };
  if !can_view(&post, viewer, follows) {
    return Err(not_found(Entity::Post));
  }
  Ok(post)
}

/// Load a post for an author-only mutation.
fn owned_post(uow: &UnitOfWork<'_>, post_id: Uuid, caller: Uuid) -> Result<Post> {
  let post = uow.post(post_id)?.ok_or_else(|| not_found(Entity::Post))?;
  if post.author_id != caller {
    return Err(CoreError::forbidden("only the author may modify this post").into());
  }
  Ok(post)
}

fn chat_detail(uow: &UnitOfWork<'_>, chat: Chat) -> Result<ChatDetail> {
  let participants = uow.active_participants(chat.chat_id)?;
  Ok(ChatDetail { chat, participants })
}

fn ensure_handles_free(uow: &UnitOfWork<'_>, email: &str, username: &str, except: Option<Uuid>) -> Result<()> {
  if uow.handle_taken("email", email, except)? {
    return Err(CoreError::invalid("email is already registered").into());
  }
  if uow.handle_taken("username", username, except)? {
    return Err(CoreError::invalid("username is already taken").into());
  }
  Ok(())
}

// ─── SocialStore impl ────────────────────────────────────────────────────────

impl SocialStore for SqliteStore {
  type Error = crate::Error;

  // ── Identity ──────────────────────────────────────────────────────────────

  async fn register_user(&self, input: NewUser) -> Result<User> {
    input.validate()?;
    self
      .transact(move |uow| {
        ensure_handles_free(uow, &input.email, &input.username, None)?;
        let user = User {
          user_id:      Uuid::new_v4(),
          email:        input.email,
          username:     input.username,
          display_name: input.display_name,
          bio:          None,
          status:       UserStatus::Active,
          created_at:   uow.now(),
          updated_at:   uow.now(),
        };
        uow.insert_user(&user, &input.password_hash)?;
        debug!(user_id = %user.user_id, "registered user");
        Ok(user)
      })
      .await
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.transact(move |uow| uow.user(id)).await
  }

  async fn get_credentials(&self, username: String) -> Result<Option<(User, String)>> {
    self.transact(move |uow| uow.credentials(&username)).await
  }

  async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User> {
    patch.validate()?;
    self
      .transact(move |uow| {
        let mut user = uow.require_user(id)?;
        if let Some(email) = patch.email {
          user.email = email;
        }
        if let Some(username) = patch.username {
          user.username = username;
        }
        if let Some(display_name) = patch.display_name {
          user.display_name = Some(display_name).filter(|d| !d.is_empty());
        }
        if let Some(bio) = patch.bio {
          user.bio = Some(bio).filter(|b| !b.is_empty());
        }
        ensure_handles_free(uow, &user.email, &user.username, Some(id))?;
        user.updated_at = uow.now();
        uow.save_user(&user)?;
        Ok(user)
      })
      .await
  }

  async fn delete_user(&self, id: Uuid) -> Result<()> {
    self
      .transact(move |uow| {
        if !uow.delete_user(id)? {
          return Err(not_found(Entity::User));
        }
        debug!(user_id = %id, "soft-deleted user");
        Ok(())
      })
      .await
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn create_post(&self, author_id: Uuid, input: NewPost) -> Result<Post> {
    input.validate()?;
    self
      .transact(move |uow| {
        uow.require_user(author_id)?;
        let post = Post {
          post_id:    Uuid::new_v4(),
          author_id,
          content:    input.content.filter(|c| !c.trim().is_empty()),
          media:      input.media,
          visibility: input.visibility,
          created_at: uow.now(),
          updated_at: uow.now(),
        };
        uow.insert_post(&post)?;
        Ok(post)
      })
      .await
  }

  async fn get_post(&self, post_id: Uuid, viewer: Option<Uuid>) -> Result<Option<PostView>> {
    self
      .transact(move |uow| match visible_post(uow, post_id, viewer) {
        Ok(post) => Ok(annotate(uow, vec![post], viewer)?.pop()),
        Err(crate::Error::Core(CoreError::NotFound(Entity::Post))) => Ok(None),
        Err(e) => Err(e),
      })
      .await
  }

  async fn update_post(&self, post_id: Uuid, caller: Uuid, patch: PostPatch) -> Result<Post> {
    self
      .transact(move |uow| {
        let mut post = owned_post(uow, post_id, caller)?;
        patch.apply(&mut post)?;
        post.updated_at = uow.now();
        uow.save_post(&post)?;
        Ok(post)
      })
      .await
  }

  async fn delete_post(&self, post_id: Uuid, caller: Uuid) -> Result<()> {
    self
      .transact(move |uow| {
        owned_post(uow, post_id, caller)?;
        uow.delete_post(post_id)?;
        Ok(())
      })
      .await
  }

  // ── Feeds ─────────────────────────────────────────────────────────────────

  async fn list_public_posts(
    &self,
    page: Page,
    query: Option<String>,
    viewer: Option<Uuid>,
  ) -> Result<Vec<PostView>> {
    self
      .transact(move |uow| {
        let query = query.as_deref().map(str::trim).filter(|q| !q.is_empty());
        let posts = uow.public_posts(page, query)?;
        annotate(uow, posts, viewer)
      })
      .await
  }

  async fn list_author_posts(
    &self,
    author_id: Uuid,
    viewer: Option<Uuid>,
    page: Page,
  ) -> Result<Vec<PostView>> {
    self
      .transact(move |uow| {
        uow.require_user(author_id)?;
        let is_author = viewer == Some(author_id);
        let follows = match viewer {
          Some(v) if !is_author => uow.is_following(v, author_id)?,
          _ => false,
        };
        let mut posts = uow.author_posts(author_id, page, is_author || follows, is_author)?;
        posts.retain(|p| can_view(p, viewer, follows));
        annotate(uow, posts, viewer)
      })
      .await
  }

  async fn list_feed(&self, viewer: Uuid, page: Page) -> Result<Vec<PostView>> {
    self
      .transact(move |uow| {
        let audience = Viewer::new(Some(viewer), uow.followees(viewer)?);
        let mut posts = uow.followee_posts(viewer, page)?;
        posts.retain(|p| audience.can_view(p));
        annotate(uow, posts, Some(viewer))
      })
      .await
  }

  async fn batch_engagement(&self, post_ids: Vec<Uuid>, viewer: Option<Uuid>) -> Result<Engagement> {
    self
      .transact(move |uow| uow.engagement(&post_ids, viewer))
      .await
  }

  // ── Comments and reactions ────────────────────────────────────────────────

  async fn add_comment(&self, post_id: Uuid, author_id: Uuid, content: String) -> Result<Comment> {
    validate_comment(&content)?;
    let (comment, pending) = self
      .transact(move |uow| {
        uow.require_user(author_id)?;
        let post = visible_post(uow, post_id, Some(author_id))?;
        let comment = Comment {
          comment_id: Uuid::new_v4(),
          post_id,
          author_id,
          content,
          created_at: uow.now(),
          updated_at: uow.now(),
        };
        uow.insert_comment(&comment)?;

        let mut pending = Vec::new();
        if post.author_id != author_id {
          pending.push(PendingNotification::commented(
            post.author_id,
            post_id,
            comment.comment_id,
            author_id,
          ));
        }
        Ok((comment, pending))
      })
      .await?;
    self.dispatch(pending).await;
    Ok(comment)
  }

  async fn list_comments(&self, post_id: Uuid, viewer: Option<Uuid>, page: Page) -> Result<Vec<Comment>> {
    self
      .transact(move |uow| {
        visible_post(uow, post_id, viewer)?;
        uow.comments(post_id, page)
      })
      .await
  }

  async fn delete_comment(&self, comment_id: Uuid, caller: Uuid) -> Result<()> {
    self
      .transact(move |uow| {
        let comment = uow
          .comment(comment_id)?
          .ok_or_else(|| not_found(Entity::Comment))?;
        let post_author = uow.post(comment.post_id)?.map(|p| p.author_id);
        if comment.author_id != caller && post_author != Some(caller) {
          return Err(
            CoreError::forbidden("only the comment or post author may delete a comment").into(),
          );
        }
        uow.delete_comment(comment_id)?;
        Ok(())
      })
      .await
  }

  async fn set_reaction(&self, post_id: Uuid, user_id: Uuid, kind: ReactionKind) -> Result<Reaction> {
    self
      .transact(move |uow| {
        uow.require_user(user_id)?;
        visible_post(uow, post_id, Some(user_id))?;
        uow.upsert_reaction(post_id, user_id, kind)
      })
      .await
  }

  async fn remove_reaction(&self, post_id: Uuid, user_id: Uuid) -> Result<()> {
    self
      .transact(move |uow| {
        visible_post(uow, post_id, Some(user_id))?;
        if !uow.delete_reaction(post_id, user_id)? {
          return Err(not_found(Entity::Reaction));
        }
        Ok(())
      })
      .await
  }

  // ── Relationship graph ────────────────────────────────────────────────────

  async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<Follow> {
    check_follow(follower_id, followee_id)?;
    let (edge, pending) = self
      .transact(move |uow| {
        uow.require_user(follower_id)?;
        uow.require_user(followee_id)?;
        let (edge, changed) = uow.upsert_follow(follower_id, followee_id)?;
        let pending = if changed {
          debug!(%follower_id, %followee_id, "follow edge written");
          vec![PendingNotification::followed(followee_id, follower_id)]
        } else {
          Vec::new()
        };
        Ok((edge, pending))
      })
      .await?;
    self.dispatch(pending).await;
    Ok(edge)
  }

  async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
    self
      .transact(move |uow| {
        if !uow.delete_follow(follower_id, followee_id)? {
          return Err(not_found(Entity::Follow));
        }
        Ok(())
      })
      .await
  }

  async fn list_followers(&self, user_id: Uuid, page: Page) -> Result<Vec<User>> {
    self
      .transact(move |uow| {
        uow.require_user(user_id)?;
        uow.follow_neighbours(user_id, true, page)
      })
      .await
  }

  async fn list_following(&self, user_id: Uuid, page: Page) -> Result<Vec<User>> {
    self
      .transact(move |uow| {
        uow.require_user(user_id)?;
        uow.follow_neighbours(user_id, false, page)
      })
      .await
  }

  // ── Chats ─────────────────────────────────────────────────────────────────

  async fn create_direct_chat(&self, creator_id: Uuid, other_id: Uuid) -> Result<(ChatDetail, bool)> {
    let other_id = chat::direct_counterpart(creator_id, &[other_id])?;
    self
      .transact(move |uow| {
        uow.require_user(creator_id)?;
        uow.require_user(other_id)?;
        let key = chat::direct_key(creator_id, other_id);

        if let Some(existing) = uow.direct_chat(&key)? {
          // A creator who had left gets their seat back; the other side is
          // left as it is.
          let departed = uow
            .participant(existing.chat_id, creator_id)?
            .filter(|me| !me.is_active());
          if let Some(me) = departed {
            uow.upsert_participant(existing.chat_id, creator_id, me.role)?;
          }
          return Ok((chat_detail(uow, existing)?, false));
        }

        let chat = Chat {
          chat_id:         Uuid::new_v4(),
          kind:            ChatKind::Direct,
          title:           None,
          created_by:      creator_id,
          last_message_at: None,
          created_at:      uow.now(),
          updated_at:      uow.now(),
        };
        uow.insert_chat(&chat, Some(&key))?;
        uow.upsert_participant(chat.chat_id, creator_id, ChatRole::Owner)?;
        uow.upsert_participant(chat.chat_id, other_id, ChatRole::Member)?;
        debug!(chat_id = %chat.chat_id, "created direct chat");
        Ok((chat_detail(uow, chat)?, true))
      })
      .await
  }

  async fn create_group_chat(
    &self,
    creator_id: Uuid,
    title: Option<String>,
    participant_ids: Vec<Uuid>,
  ) -> Result<ChatDetail> {
    let members = chat::group_members(creator_id, &participant_ids);
    self
      .transact(move |uow| {
        uow.require_user(creator_id)?;
        for member in &members {
          uow.require_user(*member)?;
        }

        let chat = Chat {
          chat_id:         Uuid::new_v4(),
          kind:            ChatKind::Group,
          title:           title.filter(|t| !t.trim().is_empty()),
          created_by:      creator_id,
          last_message_at: None,
          created_at:      uow.now(),
          updated_at:      uow.now(),
        };
        uow.insert_chat(&chat, None)?;
        uow.upsert_participant(chat.chat_id, creator_id, ChatRole::Owner)?;
        for member in &members {
          uow.upsert_participant(chat.chat_id, *member, ChatRole::Member)?;
        }
        debug!(chat_id = %chat.chat_id, members = members.len(), "created group chat");
        chat_detail(uow, chat)
      })
      .await
  }

  async fn get_chat(&self, chat_id: Uuid, caller: Uuid) -> Result<ChatDetail> {
    self
      .transact(move |uow| {
        let (chat, _) = uow.membership(chat_id, caller)?;
        chat_detail(uow, chat)
      })
      .await
  }

  async fn list_chats(&self, user_id: Uuid, page: Page) -> Result<Vec<Chat>> {
    self.transact(move |uow| uow.chats_for(user_id, page)).await
  }

  async fn update_chat(&self, chat_id: Uuid, caller: Uuid, title: Option<String>) -> Result<Chat> {
    self
      .transact(move |uow| {
        let (mut chat, me) = uow.membership(chat_id, caller)?;
        access::authorize_update(chat.kind, Some(&me))?;
        chat.title = title.filter(|t| !t.trim().is_empty());
        chat.updated_at = uow.now();
        uow.save_chat(&chat)?;
        Ok(chat)
      })
      .await
  }

  async fn add_participant(&self, chat_id: Uuid, caller: Uuid, target: Uuid) -> Result<Participant> {
    self
      .transact(move |uow| {
        let (chat, me) = uow.membership(chat_id, caller)?;
        let existing = uow.participant(chat_id, target)?;
        let plan = access::authorize_add(chat.kind, Some(&me), existing.as_ref())?;
        uow.require_user(target)?;
        match (plan, existing) {
          (AddPlan::AlreadyActive, Some(p)) => Ok(p),
          _ => {
            debug!(%chat_id, %target, ?plan, "adding participant");
            uow.upsert_participant(chat_id, target, ChatRole::Member)
          }
        }
      })
      .await
  }

  async fn remove_participant(&self, chat_id: Uuid, caller: Uuid, target: Uuid) -> Result<()> {
    self
      .transact(move |uow| {
        let (chat, me) = uow.membership(chat_id, caller)?;
        let them = if target == caller {
          Some(me.clone())
        } else {
          uow.participant(chat_id, target)?
        };
        let removal =
          access::authorize_remove(chat.kind, caller, Some(&me), target, them.as_ref())?;
        uow.mark_left(chat_id, target)?;
        match removal {
          Removal::Leave => debug!(%chat_id, user = %caller, "participant left"),
          Removal::Kick => debug!(%chat_id, %target, by = %caller, "participant removed"),
        }
        Ok(())
      })
      .await
  }

  async fn send_message(&self, chat_id: Uuid, sender_id: Uuid, input: NewMessage) -> Result<Message> {
    input.validate()?;
    let (message, pending) = self
      .transact(move |uow| {
        let (mut chat, me) = uow.membership(chat_id, sender_id)?;
        access::authorize_send(Some(&me))?;

        let message = Message {
          message_id: Uuid::new_v4(),
          chat_id,
          sender_id,
          content: input.content.filter(|c| !c.trim().is_empty()),
          media: input.media,
          created_at: uow.now(),
          updated_at: uow.now(),
        };
        uow.insert_message(&message)?;

        chat.last_message_at = Some(message.created_at);
        chat.updated_at = uow.now();
        uow.save_chat(&chat)?;

        let pending = uow
          .active_participants(chat_id)?
          .into_iter()
          .filter(|p| p.user_id != sender_id)
          .map(|p| {
            PendingNotification::messaged(p.user_id, chat_id, message.message_id, sender_id)
          })
          .collect::<Vec<_>>();
        Ok((message, pending))
      })
      .await?;
    self.dispatch(pending).await;
    Ok(message)
  }

  async fn list_messages(
    &self,
    chat_id: Uuid,
    caller: Uuid,
    page: Page,
    before: Option<DateTime<Utc>>,
  ) -> Result<Vec<Message>> {
    self
      .transact(move |uow| {
        let (_, me) = uow.membership(chat_id, caller)?;
        access::authorize_read(Some(&me))?;
        uow.messages(chat_id, page, before)
      })
      .await
  }

  async fn delete_message(&self, chat_id: Uuid, message_id: Uuid, caller: Uuid) -> Result<()> {
    self
      .transact(move |uow| {
        uow.membership(chat_id, caller)?;
        let message = uow
          .message(message_id)?
          .filter(|m| m.chat_id == chat_id)
          .ok_or_else(|| not_found(Entity::Message))?;
        if message.sender_id != caller {
          return Err(CoreError::forbidden("only the sender may delete a message").into());
        }
        uow.delete_message(message_id)?;
        Ok(())
      })
      .await
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn list_notifications(
    &self,
    user_id: Uuid,
    page: Page,
    unread_only: bool,
  ) -> Result<Vec<Notification>> {
    self
      .transact(move |uow| uow.notifications(user_id, page, unread_only))
      .await
  }

  async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<Notification> {
    self
      .transact(move |uow| {
        // Someone else's notification is reported as missing, not forbidden.
        let owned = uow
          .notification(notification_id)?
          .filter(|n| n.owner_id == user_id)
          .ok_or_else(|| not_found(Entity::Notification))?;
        uow.mark_read(owned.notification_id)?;
        uow
          .notification(notification_id)?
          .ok_or_else(|| not_found(Entity::Notification))
      })
      .await
  }

  async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64> {
    self.transact(move |uow| uow.mark_all_read(user_id)).await
  }
}
