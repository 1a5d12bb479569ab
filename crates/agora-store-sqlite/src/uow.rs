//! [`UnitOfWork`] — one request-scoped SQLite transaction and every query the
//! store issues inside it.
//!
//! All reads select from the `live_*` views, so soft-deleted rows are
//! invisible here and nowhere else needs to remember the predicate. Writes hit
//! the base tables and never `DELETE`.

use std::collections::{HashMap, HashSet};

use agora_core::{
  Entity,
  access,
  chat::{Chat, ChatRole, Message, Participant},
  engagement::{Comment, Engagement, Reaction, ReactionKind},
  follow::{Follow, FollowStatus},
  notification::{Notification, PendingNotification},
  page::Page,
  post::{Post, Visibility},
  user::User,
};
use chrono::{DateTime, Utc};
use rusqlite::{
  Connection, Params, Transaction, TransactionBehavior, params, params_from_iter,
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{Record, cursor_dt, decode_uuid, encode_dt, encode_media, encode_uuid, now},
};

/// Shorthand for a domain "not found" wrapped in the store error.
pub fn not_found(entity: Entity) -> Error { Error::Core(agora_core::Error::NotFound(entity)) }

/// `?first, ?first+1, ...` for a dynamic `IN (...)` list.
fn placeholders(count: usize, first: usize) -> String {
  (first..first + count)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Unit of work ────────────────────────────────────────────────────────────

/// A single IMMEDIATE transaction plus the timestamp every write in it uses.
///
/// Dropping it without [`UnitOfWork::run`] reaching commit rolls back.
pub struct UnitOfWork<'c> {
  tx:  Transaction<'c>,
  now: DateTime<Utc>,
}

impl UnitOfWork<'_> {
  /// Run `work` inside a fresh transaction, committing only if it succeeds.
  ///
  /// IMMEDIATE takes the write lock up front, so read-then-write sequences
  /// (dedup lookups, revivals) cannot interleave with another writer.
  pub fn run<T, F>(conn: &mut Connection, work: F) -> Result<T>
  where
    F: FnOnce(&UnitOfWork<'_>) -> Result<T>,
  {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let uow = UnitOfWork { tx, now: now() };
    let out = work(&uow)?;
    uow.tx.commit()?;
    Ok(out)
  }

  pub fn now(&self) -> DateTime<Utc> { self.now }

  fn fetch_one<T: Record>(&self, sql: &str, params: impl Params) -> Result<Option<T>> {
    let mut stmt = self.tx.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
      Some(row) => Ok(Some(T::from_row(row)?)),
      None => Ok(None),
    }
  }

  fn fetch_all<T: Record>(&self, sql: &str, params: impl Params) -> Result<Vec<T>> {
    let mut stmt = self.tx.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
      out.push(T::from_row(row)?);
    }
    Ok(out)
  }

  fn exists(&self, sql: &str, params: impl Params) -> Result<bool> {
    Ok(self.tx.query_row(sql, params, |r| r.get(0))?)
  }

  /// Flag a row as deleted. Returns `false` if it was already gone.
  fn soft_delete(&self, table: &str, id_column: &str, id: Uuid) -> Result<bool> {
    let sql = format!(
      "UPDATE {table} SET is_deleted = 1, deleted_at = ?1, updated_at = ?1
       WHERE {id_column} = ?2 AND is_deleted = 0"
    );
    let n = self.tx.execute(&sql, params![encode_dt(self.now), encode_uuid(id)])?;
    Ok(n > 0)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  pub fn user(&self, id: Uuid) -> Result<Option<User>> {
    self.fetch_one(
      &format!("SELECT {} FROM live_users u WHERE u.user_id = ?1", User::COLUMNS),
      params![encode_uuid(id)],
    )
  }

  pub fn require_user(&self, id: Uuid) -> Result<User> {
    self.user(id)?.ok_or_else(|| not_found(Entity::User))
  }

  pub fn credentials(&self, username: &str) -> Result<Option<(User, String)>> {
    let sql = format!(
      "SELECT {}, u.password_hash FROM live_users u WHERE u.username = ?1",
      User::COLUMNS
    );
    let mut stmt = self.tx.prepare(&sql)?;
    let mut rows = stmt.query(params![username])?;
    match rows.next()? {
      Some(row) => Ok(Some((User::from_row(row)?, row.get(8)?))),
      None => Ok(None),
    }
  }

  /// Whether a live account other than `except` already uses `value` in the
  /// `email` or `username` column.
  pub fn handle_taken(&self, column: &'static str, value: &str, except: Option<Uuid>) -> Result<bool> {
    self.exists(
      &format!(
        "SELECT EXISTS(SELECT 1 FROM live_users u WHERE u.{column} = ?1 AND u.user_id IS NOT ?2)"
      ),
      params![value, except.map(encode_uuid)],
    )
  }

  pub fn insert_user(&self, user: &User, password_hash: &str) -> Result<()> {
    self.tx.execute(
      "INSERT INTO users (
         user_id, email, username, password_hash, display_name, bio, status,
         created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
      params![
        encode_uuid(user.user_id),
        user.email,
        user.username,
        password_hash,
        user.display_name,
        user.bio,
        user.status.as_ref(),
        encode_dt(user.created_at),
        encode_dt(user.updated_at),
      ],
    )?;
    Ok(())
  }

  pub fn save_user(&self, user: &User) -> Result<()> {
    self.tx.execute(
      "UPDATE users
       SET email = ?2, username = ?3, display_name = ?4, bio = ?5, status = ?6, updated_at = ?7
       WHERE user_id = ?1",
      params![
        encode_uuid(user.user_id),
        user.email,
        user.username,
        user.display_name,
        user.bio,
        user.status.as_ref(),
        encode_dt(user.updated_at),
      ],
    )?;
    Ok(())
  }

  pub fn delete_user(&self, id: Uuid) -> Result<bool> { self.soft_delete("users", "user_id", id) }

  // ── Posts ─────────────────────────────────────────────────────────────────

  pub fn post(&self, id: Uuid) -> Result<Option<Post>> {
    self.fetch_one(
      &format!("SELECT {} FROM live_posts p WHERE p.post_id = ?1", Post::COLUMNS),
      params![encode_uuid(id)],
    )
  }

  pub fn insert_post(&self, post: &Post) -> Result<()> {
    self.tx.execute(
      "INSERT INTO posts (post_id, author_id, content, media, visibility, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      params![
        encode_uuid(post.post_id),
        encode_uuid(post.author_id),
        post.content,
        encode_media(&post.media)?,
        post.visibility.as_ref(),
        encode_dt(post.created_at),
        encode_dt(post.updated_at),
      ],
    )?;
    Ok(())
  }

  pub fn save_post(&self, post: &Post) -> Result<()> {
    self.tx.execute(
      "UPDATE posts SET content = ?2, media = ?3, visibility = ?4, updated_at = ?5
       WHERE post_id = ?1",
      params![
        encode_uuid(post.post_id),
        post.content,
        encode_media(&post.media)?,
        post.visibility.as_ref(),
        encode_dt(post.updated_at),
      ],
    )?;
    Ok(())
  }

  pub fn delete_post(&self, id: Uuid) -> Result<bool> { self.soft_delete("posts", "post_id", id) }

  /// Public posts, newest first, optionally restricted to a case-sensitive
  /// content substring.
  pub fn public_posts(&self, page: Page, query: Option<&str>) -> Result<Vec<Post>> {
    self.fetch_all(
      &format!(
        "SELECT {} FROM live_posts p
         WHERE p.visibility = ?1
           AND (?2 IS NULL OR instr(p.content, ?2) > 0)
         ORDER BY p.created_at DESC, p.seq DESC
         LIMIT ?3 OFFSET ?4",
        Post::COLUMNS
      ),
      params![
        Visibility::Public.as_ref(),
        query,
        page.limit(),
        page.offset()
      ],
    )
  }

  /// One author's posts, newest first. Public posts are always included; the
  /// flags open up the other visibility levels.
  pub fn author_posts(
    &self,
    author_id: Uuid,
    page: Page,
    include_followers: bool,
    include_private: bool,
  ) -> Result<Vec<Post>> {
    self.fetch_all(
      &format!(
        "SELECT {} FROM live_posts p
         WHERE p.author_id = ?1
           AND (p.visibility = ?2
                OR (p.visibility = ?3 AND ?4)
                OR (p.visibility = ?5 AND ?6))
         ORDER BY p.created_at DESC, p.seq DESC
         LIMIT ?7 OFFSET ?8",
        Post::COLUMNS
      ),
      params![
        encode_uuid(author_id),
        Visibility::Public.as_ref(),
        Visibility::Followers.as_ref(),
        include_followers,
        Visibility::Private.as_ref(),
        include_private,
        page.limit(),
        page.offset(),
      ],
    )
  }

  /// Public and followers-only posts by everyone `viewer` follows.
  pub fn followee_posts(&self, viewer: Uuid, page: Page) -> Result<Vec<Post>> {
    self.fetch_all(
      &format!(
        "SELECT {} FROM live_posts p
         JOIN live_follows f ON f.followee_id = p.author_id
         WHERE f.follower_id = ?1
           AND f.status = ?2
           AND p.visibility IN (?3, ?4)
         ORDER BY p.created_at DESC, p.seq DESC
         LIMIT ?5 OFFSET ?6",
        Post::COLUMNS
      ),
      params![
        encode_uuid(viewer),
        FollowStatus::Accepted.as_ref(),
        Visibility::Public.as_ref(),
        Visibility::Followers.as_ref(),
        page.limit(),
        page.offset(),
      ],
    )
  }

  // ── Engagement ────────────────────────────────────────────────────────────

  /// Three grouped queries regardless of how many posts are in the batch.
  pub fn engagement(&self, post_ids: &[Uuid], viewer: Option<Uuid>) -> Result<Engagement> {
    let mut engagement = Engagement::default();
    if post_ids.is_empty() {
      return Ok(engagement);
    }
    let ids: Vec<String> = post_ids.iter().copied().map(encode_uuid).collect();

    engagement.reaction_counts = self.count_by_post("live_reactions", &ids)?;
    engagement.comment_counts = self.count_by_post("live_comments", &ids)?;

    if let Some(viewer) = viewer {
      let sql = format!(
        "SELECT post_id FROM live_reactions
         WHERE user_id = ?1 AND kind = ?2 AND post_id IN ({})",
        placeholders(ids.len(), 3)
      );
      let mut values = vec![encode_uuid(viewer), ReactionKind::Like.as_ref().to_owned()];
      values.extend(ids.iter().cloned());

      let mut stmt = self.tx.prepare(&sql)?;
      let mut rows = stmt.query(params_from_iter(values.iter()))?;
      while let Some(row) = rows.next()? {
        engagement.liked.insert(decode_uuid(&row.get::<_, String>(0)?)?);
      }
    }

    Ok(engagement)
  }

  fn count_by_post(&self, view: &str, ids: &[String]) -> Result<HashMap<Uuid, u64>> {
    let sql = format!(
      "SELECT post_id, COUNT(*) FROM {view} WHERE post_id IN ({}) GROUP BY post_id",
      placeholders(ids.len(), 1)
    );
    let mut stmt = self.tx.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(ids.iter()))?;
    let mut counts = HashMap::with_capacity(ids.len());
    while let Some(row) = rows.next()? {
      let post_id = decode_uuid(&row.get::<_, String>(0)?)?;
      let count: i64 = row.get(1)?;
      counts.insert(post_id, count.max(0) as u64);
    }
    Ok(counts)
  }

  // ── Follows ───────────────────────────────────────────────────────────────

  pub fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
    self.exists(
      "SELECT EXISTS(
         SELECT 1 FROM live_follows f
         WHERE f.follower_id = ?1 AND f.followee_id = ?2 AND f.status = ?3
       )",
      params![
        encode_uuid(follower_id),
        encode_uuid(followee_id),
        FollowStatus::Accepted.as_ref()
      ],
    )
  }

  /// Everyone `user_id` follows with an accepted, live edge.
  pub fn followees(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
    let mut stmt = self.tx.prepare(
      "SELECT f.followee_id FROM live_follows f WHERE f.follower_id = ?1 AND f.status = ?2",
    )?;
    let mut rows = stmt.query(params![
      encode_uuid(user_id),
      FollowStatus::Accepted.as_ref()
    ])?;
    let mut out = HashSet::new();
    while let Some(row) = rows.next()? {
      out.insert(decode_uuid(&row.get::<_, String>(0)?)?);
    }
    Ok(out)
  }

  pub fn follow_edge(&self, follower_id: Uuid, followee_id: Uuid) -> Result<Option<Follow>> {
    self.fetch_one(
      &format!(
        "SELECT {} FROM live_follows f WHERE f.follower_id = ?1 AND f.followee_id = ?2",
        Follow::COLUMNS
      ),
      params![encode_uuid(follower_id), encode_uuid(followee_id)],
    )
  }

  /// Insert the edge, or resurrect the existing row for the pair.
  ///
  /// Returns the live edge and whether anything changed; following someone
  /// already followed is a no-op.
  pub fn upsert_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<(Follow, bool)> {
    let changed = self.tx.execute(
      "INSERT INTO follows (follow_id, follower_id, followee_id, status, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?5)
       ON CONFLICT (follower_id, followee_id) DO UPDATE SET
         status = excluded.status,
         is_deleted = 0,
         deleted_at = NULL,
         updated_at = excluded.updated_at
       WHERE follows.is_deleted = 1 OR follows.status != excluded.status",
      params![
        encode_uuid(Uuid::new_v4()),
        encode_uuid(follower_id),
        encode_uuid(followee_id),
        FollowStatus::Accepted.as_ref(),
        encode_dt(self.now),
      ],
    )?;
    let edge = self
      .follow_edge(follower_id, followee_id)?
      .ok_or_else(|| not_found(Entity::Follow))?;
    Ok((edge, changed > 0))
  }

  pub fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
    let n = self.tx.execute(
      "UPDATE follows SET is_deleted = 1, deleted_at = ?3, updated_at = ?3
       WHERE follower_id = ?1 AND followee_id = ?2 AND is_deleted = 0",
      params![
        encode_uuid(follower_id),
        encode_uuid(followee_id),
        encode_dt(self.now)
      ],
    )?;
    Ok(n > 0)
  }

  /// Users on the other end of `user_id`'s accepted edges. `inbound` selects
  /// followers; otherwise followees.
  pub fn follow_neighbours(&self, user_id: Uuid, inbound: bool, page: Page) -> Result<Vec<User>> {
    let (anchor, other) = if inbound {
      ("followee_id", "follower_id")
    } else {
      ("follower_id", "followee_id")
    };
    self.fetch_all(
      &format!(
        "SELECT {} FROM live_follows f
         JOIN live_users u ON u.user_id = f.{other}
         WHERE f.{anchor} = ?1 AND f.status = ?2
         ORDER BY f.updated_at DESC, u.user_id
         LIMIT ?3 OFFSET ?4",
        User::COLUMNS
      ),
      params![
        encode_uuid(user_id),
        FollowStatus::Accepted.as_ref(),
        page.limit(),
        page.offset()
      ],
    )
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  pub fn comment(&self, id: Uuid) -> Result<Option<Comment>> {
    self.fetch_one(
      &format!("SELECT {} FROM live_comments c WHERE c.comment_id = ?1", Comment::COLUMNS),
      params![encode_uuid(id)],
    )
  }

  pub fn insert_comment(&self, comment: &Comment) -> Result<()> {
    self.tx.execute(
      "INSERT INTO comments (comment_id, post_id, author_id, content, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(comment.comment_id),
        encode_uuid(comment.post_id),
        encode_uuid(comment.author_id),
        comment.content,
        encode_dt(comment.created_at),
        encode_dt(comment.updated_at),
      ],
    )?;
    Ok(())
  }

  /// Oldest first, so threads read top to bottom.
  pub fn comments(&self, post_id: Uuid, page: Page) -> Result<Vec<Comment>> {
    self.fetch_all(
      &format!(
        "SELECT {} FROM live_comments c
         WHERE c.post_id = ?1
         ORDER BY c.created_at ASC, c.seq ASC
         LIMIT ?2 OFFSET ?3",
        Comment::COLUMNS
      ),
      params![encode_uuid(post_id), page.limit(), page.offset()],
    )
  }

  pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
    self.soft_delete("comments", "comment_id", id)
  }

  // ── Reactions ─────────────────────────────────────────────────────────────

  pub fn reaction(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Reaction>> {
    self.fetch_one(
      &format!(
        "SELECT {} FROM live_reactions r WHERE r.post_id = ?1 AND r.user_id = ?2",
        Reaction::COLUMNS
      ),
      params![encode_uuid(post_id), encode_uuid(user_id)],
    )
  }

  /// Write the user's reaction to a post, overwriting (and reviving) the one
  /// row that exists for the pair.
  pub fn upsert_reaction(&self, post_id: Uuid, user_id: Uuid, kind: ReactionKind) -> Result<Reaction> {
    self.tx.execute(
      "INSERT INTO reactions (reaction_id, post_id, user_id, kind, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?5)
       ON CONFLICT (post_id, user_id) DO UPDATE SET
         kind = excluded.kind,
         is_deleted = 0,
         deleted_at = NULL,
         updated_at = excluded.updated_at",
      params![
        encode_uuid(Uuid::new_v4()),
        encode_uuid(post_id),
        encode_uuid(user_id),
        kind.as_ref(),
        encode_dt(self.now),
      ],
    )?;
    self
      .reaction(post_id, user_id)?
      .ok_or_else(|| not_found(Entity::Reaction))
  }

  pub fn delete_reaction(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
    let n = self.tx.execute(
      "UPDATE reactions SET is_deleted = 1, deleted_at = ?3, updated_at = ?3
       WHERE post_id = ?1 AND user_id = ?2 AND is_deleted = 0",
      params![encode_uuid(post_id), encode_uuid(user_id), encode_dt(self.now)],
    )?;
    Ok(n > 0)
  }

  // ── Chats ─────────────────────────────────────────────────────────────────

  pub fn chat(&self, id: Uuid) -> Result<Option<Chat>> {
    self.fetch_one(
      &format!("SELECT {} FROM live_chats ch WHERE ch.chat_id = ?1", Chat::COLUMNS),
      params![encode_uuid(id)],
    )
  }

  pub fn direct_chat(&self, direct_key: &str) -> Result<Option<Chat>> {
    self.fetch_one(
      &format!("SELECT {} FROM live_chats ch WHERE ch.direct_key = ?1", Chat::COLUMNS),
      params![direct_key],
    )
  }

  pub fn insert_chat(&self, chat: &Chat, direct_key: Option<&str>) -> Result<()> {
    self.tx.execute(
      "INSERT INTO chats (
         chat_id, kind, title, created_by, direct_key, last_message_at, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      params![
        encode_uuid(chat.chat_id),
        chat.kind.as_ref(),
        chat.title,
        encode_uuid(chat.created_by),
        direct_key,
        chat.last_message_at.map(encode_dt),
        encode_dt(chat.created_at),
        encode_dt(chat.updated_at),
      ],
    )?;
    Ok(())
  }

  pub fn save_chat(&self, chat: &Chat) -> Result<()> {
    self.tx.execute(
      "UPDATE chats SET title = ?2, last_message_at = ?3, updated_at = ?4 WHERE chat_id = ?1",
      params![
        encode_uuid(chat.chat_id),
        chat.title,
        chat.last_message_at.map(encode_dt),
        encode_dt(chat.updated_at),
      ],
    )?;
    Ok(())
  }

  /// Chats `user_id` is active in, most recent activity first.
  pub fn chats_for(&self, user_id: Uuid, page: Page) -> Result<Vec<Chat>> {
    self.fetch_all(
      &format!(
        "SELECT {} FROM live_chats ch
         JOIN live_chat_participants cp ON cp.chat_id = ch.chat_id
         WHERE cp.user_id = ?1 AND cp.left_at IS NULL
         ORDER BY COALESCE(ch.last_message_at, ch.created_at) DESC, ch.chat_id
         LIMIT ?2 OFFSET ?3",
        Chat::COLUMNS
      ),
      params![encode_uuid(user_id), page.limit(), page.offset()],
    )
  }

  // ── Participants ──────────────────────────────────────────────────────────

  pub fn participant(&self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Participant>> {
    self.fetch_one(
      &format!(
        "SELECT {} FROM live_chat_participants cp WHERE cp.chat_id = ?1 AND cp.user_id = ?2",
        Participant::COLUMNS
      ),
      params![encode_uuid(chat_id), encode_uuid(user_id)],
    )
  }

  pub fn active_participants(&self, chat_id: Uuid) -> Result<Vec<Participant>> {
    self.fetch_all(
      &format!(
        "SELECT {} FROM live_chat_participants cp
         WHERE cp.chat_id = ?1 AND cp.left_at IS NULL
         ORDER BY cp.joined_at ASC, cp.user_id",
        Participant::COLUMNS
      ),
      params![encode_uuid(chat_id)],
    )
  }

  /// Make `user_id` an active participant with `role`, reusing the pair's row
  /// if one exists.
  pub fn upsert_participant(&self, chat_id: Uuid, user_id: Uuid, role: ChatRole) -> Result<Participant> {
    self.tx.execute(
      "INSERT INTO chat_participants (chat_id, user_id, role, joined_at, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?4, ?4)
       ON CONFLICT (chat_id, user_id) DO UPDATE SET
         role = excluded.role,
         joined_at = excluded.joined_at,
         left_at = NULL,
         is_deleted = 0,
         deleted_at = NULL,
         updated_at = excluded.updated_at",
      params![
        encode_uuid(chat_id),
        encode_uuid(user_id),
        role.as_ref(),
        encode_dt(self.now),
      ],
    )?;
    self
      .participant(chat_id, user_id)?
      .ok_or_else(|| not_found(Entity::Participant))
  }

  pub fn mark_left(&self, chat_id: Uuid, user_id: Uuid) -> Result<bool> {
    let n = self.tx.execute(
      "UPDATE chat_participants SET left_at = ?3, updated_at = ?3
       WHERE chat_id = ?1 AND user_id = ?2 AND left_at IS NULL AND is_deleted = 0",
      params![encode_uuid(chat_id), encode_uuid(user_id), encode_dt(self.now)],
    )?;
    Ok(n > 0)
  }

  /// Resolve a caller's access to a chat.
  ///
  /// Membership is checked before existence: a caller with no active record
  /// is denied whether or not the chat exists. A member of a chat that has
  /// since been deleted gets "not found".
  pub fn membership(&self, chat_id: Uuid, caller: Uuid) -> Result<(Chat, Participant)> {
    let record = self.participant(chat_id, caller)?;
    let record = access::require_active(record.as_ref())?.clone();
    let chat = self.chat(chat_id)?.ok_or_else(|| not_found(Entity::Chat))?;
    Ok((chat, record))
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  pub fn message(&self, id: Uuid) -> Result<Option<Message>> {
    self.fetch_one(
      &format!("SELECT {} FROM live_chat_messages m WHERE m.message_id = ?1", Message::COLUMNS),
      params![encode_uuid(id)],
    )
  }

  pub fn insert_message(&self, message: &Message) -> Result<()> {
    self.tx.execute(
      "INSERT INTO chat_messages (
         message_id, chat_id, sender_id, content, media, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      params![
        encode_uuid(message.message_id),
        encode_uuid(message.chat_id),
        encode_uuid(message.sender_id),
        message.content,
        encode_media(&message.media)?,
        encode_dt(message.created_at),
        encode_dt(message.updated_at),
      ],
    )?;
    Ok(())
  }

  /// Newest first; `before` keeps only messages created strictly earlier.
  pub fn messages(&self, chat_id: Uuid, page: Page, before: Option<DateTime<Utc>>) -> Result<Vec<Message>> {
    self.fetch_all(
      &format!(
        "SELECT {} FROM live_chat_messages m
         WHERE m.chat_id = ?1 AND (?2 IS NULL OR m.created_at < ?2)
         ORDER BY m.created_at DESC, m.seq DESC
         LIMIT ?3 OFFSET ?4",
        Message::COLUMNS
      ),
      params![
        encode_uuid(chat_id),
        before.map(cursor_dt),
        page.limit(),
        page.offset()
      ],
    )
  }

  pub fn delete_message(&self, id: Uuid) -> Result<bool> {
    self.soft_delete("chat_messages", "message_id", id)
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  pub fn notification(&self, id: Uuid) -> Result<Option<Notification>> {
    self.fetch_one(
      &format!(
        "SELECT {} FROM live_notifications n WHERE n.notification_id = ?1",
        Notification::COLUMNS
      ),
      params![encode_uuid(id)],
    )
  }

  pub fn insert_notification(&self, pending: &PendingNotification) -> Result<Uuid> {
    let id = Uuid::new_v4();
    self.tx.execute(
      "INSERT INTO notifications (notification_id, owner_id, kind, payload, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
      params![
        encode_uuid(id),
        encode_uuid(pending.owner_id),
        pending.kind.as_ref(),
        serde_json::to_string(&pending.payload)?,
        encode_dt(self.now),
      ],
    )?;
    Ok(id)
  }

  pub fn notifications(&self, owner_id: Uuid, page: Page, unread_only: bool) -> Result<Vec<Notification>> {
    self.fetch_all(
      &format!(
        "SELECT {} FROM live_notifications n
         WHERE n.owner_id = ?1 AND (NOT ?2 OR n.is_read = 0)
         ORDER BY n.created_at DESC, n.seq DESC
         LIMIT ?3 OFFSET ?4",
        Notification::COLUMNS
      ),
      params![encode_uuid(owner_id), unread_only, page.limit(), page.offset()],
    )
  }

  pub fn mark_read(&self, id: Uuid) -> Result<()> {
    self.tx.execute(
      "UPDATE notifications SET is_read = 1, updated_at = ?2
       WHERE notification_id = ?1 AND is_read = 0",
      params![encode_uuid(id), encode_dt(self.now)],
    )?;
    Ok(())
  }

  pub fn mark_all_read(&self, owner_id: Uuid) -> Result<u64> {
    let n = self.tx.execute(
      "UPDATE notifications SET is_read = 1, updated_at = ?2
       WHERE owner_id = ?1 AND is_read = 0 AND is_deleted = 0",
      params![encode_uuid(owner_id), encode_dt(self.now)],
    )?;
    Ok(n as u64)
  }

  /// Count raw follow rows for a pair, deleted or not. Test-only: production
  /// reads never look past the live views.
  #[cfg(test)]
  pub fn follow_rows(&self, follower_id: Uuid, followee_id: Uuid) -> Result<i64> {
    Ok(self.tx.query_row(
      "SELECT COUNT(*) FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
      params![encode_uuid(follower_id), encode_uuid(followee_id)],
      |r| r.get(0),
    )?)
  }

  /// Count raw reaction rows for a pair, deleted or not.
  #[cfg(test)]
  pub fn reaction_rows(&self, post_id: Uuid, user_id: Uuid) -> Result<i64> {
    Ok(self.tx.query_row(
      "SELECT COUNT(*) FROM reactions WHERE post_id = ?1 AND user_id = ?2",
      params![encode_uuid(post_id), encode_uuid(user_id)],
      |r| r.get(0),
    )?)
  }

  /// Count raw participant rows for a pair, left or not.
  #[cfg(test)]
  pub fn participant_rows(&self, chat_id: Uuid, user_id: Uuid) -> Result<i64> {
    Ok(self.tx.query_row(
      "SELECT COUNT(*) FROM chat_participants WHERE chat_id = ?1 AND user_id = ?2",
      params![encode_uuid(chat_id), encode_uuid(user_id)],
      |r| r.get(0),
    )?)
  }

  /// Make every notification insert fail from here on.
  #[cfg(test)]
  pub fn reject_notifications(&self) -> Result<()> {
    self.tx.execute_batch(
      "CREATE TRIGGER reject_notifications BEFORE INSERT ON notifications
       BEGIN SELECT RAISE(ABORT, 'notifications offline'); END;",
    )?;
    Ok(())
  }
}
