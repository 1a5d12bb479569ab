//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with fixed microsecond
//! precision, so lexical order equals chronological order. Enums are stored as
//! their lowercase names, media lists as compact JSON, UUIDs as hyphenated
//! lowercase strings.

use std::str::FromStr;

use agora_core::{
  chat::{Chat, ChatKind, ChatRole, Message, Participant},
  engagement::{Comment, Reaction, ReactionKind},
  follow::{Follow, FollowStatus},
  notification::{Notification, NotificationKind},
  post::{Post, Visibility},
  user::{User, UserStatus},
};
use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current instant, truncated to the stored precision so values read back
/// compare equal to the ones written.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Encode an exclusive upper bound. Sub-microsecond input rounds up so that
/// rows stored at the truncated instant still compare as earlier.
pub fn cursor_dt(dt: DateTime<Utc>) -> String {
  let truncated = dt.trunc_subsecs(6);
  if truncated < dt {
    encode_dt(truncated + TimeDelta::microseconds(1))
  } else {
    encode_dt(truncated)
  }
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Parse a lowercase enum column (visibility, role, kind, status).
pub fn decode_enum<T: FromStr>(column: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {column}: {s:?}")))
}

// ─── Media ───────────────────────────────────────────────────────────────────

pub fn encode_media(media: &[String]) -> Result<String> {
  Ok(serde_json::to_string(media)?)
}

pub fn decode_media(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Records ─────────────────────────────────────────────────────────────────

/// A domain type read straight from a `live_*` view row.
///
/// `COLUMNS` is the select list, qualified with the alias each view is always
/// queried under; `from_row` reads the columns in that order.
pub trait Record: Sized {
  const COLUMNS: &'static str;

  fn from_row(row: &Row<'_>) -> Result<Self>;
}

fn uuid_at(row: &Row<'_>, idx: usize) -> Result<Uuid> {
  decode_uuid(&row.get::<_, String>(idx)?)
}

fn dt_at(row: &Row<'_>, idx: usize) -> Result<DateTime<Utc>> {
  decode_dt(&row.get::<_, String>(idx)?)
}

fn opt_dt_at(row: &Row<'_>, idx: usize) -> Result<Option<DateTime<Utc>>> {
  row
    .get::<_, Option<String>>(idx)?
    .as_deref()
    .map(decode_dt)
    .transpose()
}

fn enum_at<T: FromStr>(row: &Row<'_>, idx: usize, column: &str) -> Result<T> {
  decode_enum(column, &row.get::<_, String>(idx)?)
}

/// Alias `u` over `live_users`.
impl Record for User {
  const COLUMNS: &'static str = "u.user_id, u.email, u.username, u.display_name, u.bio, \
                                 u.status, u.created_at, u.updated_at";

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(User {
      user_id:      uuid_at(row, 0)?,
      email:        row.get(1)?,
      username:     row.get(2)?,
      display_name: row.get(3)?,
      bio:          row.get(4)?,
      status:       enum_at::<UserStatus>(row, 5, "user status")?,
      created_at:   dt_at(row, 6)?,
      updated_at:   dt_at(row, 7)?,
    })
  }
}

/// Alias `p` over `live_posts`.
impl Record for Post {
  const COLUMNS: &'static str = "p.post_id, p.author_id, p.content, p.media, p.visibility, \
                                 p.created_at, p.updated_at";

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(Post {
      post_id:    uuid_at(row, 0)?,
      author_id:  uuid_at(row, 1)?,
      content:    row.get(2)?,
      media:      decode_media(&row.get::<_, String>(3)?)?,
      visibility: enum_at::<Visibility>(row, 4, "visibility")?,
      created_at: dt_at(row, 5)?,
      updated_at: dt_at(row, 6)?,
    })
  }
}

/// Alias `f` over `live_follows`.
impl Record for Follow {
  const COLUMNS: &'static str = "f.follow_id, f.follower_id, f.followee_id, f.status, \
                                 f.created_at, f.updated_at";

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(Follow {
      follow_id:   uuid_at(row, 0)?,
      follower_id: uuid_at(row, 1)?,
      followee_id: uuid_at(row, 2)?,
      status:      enum_at::<FollowStatus>(row, 3, "follow status")?,
      created_at:  dt_at(row, 4)?,
      updated_at:  dt_at(row, 5)?,
    })
  }
}

/// Alias `c` over `live_comments`.
impl Record for Comment {
  const COLUMNS: &'static str =
    "c.comment_id, c.post_id, c.author_id, c.content, c.created_at, c.updated_at";

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(Comment {
      comment_id: uuid_at(row, 0)?,
      post_id:    uuid_at(row, 1)?,
      author_id:  uuid_at(row, 2)?,
      content:    row.get(3)?,
      created_at: dt_at(row, 4)?,
      updated_at: dt_at(row, 5)?,
    })
  }
}

/// Alias `r` over `live_reactions`.
impl Record for Reaction {
  const COLUMNS: &'static str =
    "r.reaction_id, r.post_id, r.user_id, r.kind, r.created_at, r.updated_at";

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(Reaction {
      reaction_id: uuid_at(row, 0)?,
      post_id:     uuid_at(row, 1)?,
      user_id:     uuid_at(row, 2)?,
      kind:        enum_at::<ReactionKind>(row, 3, "reaction kind")?,
      created_at:  dt_at(row, 4)?,
      updated_at:  dt_at(row, 5)?,
    })
  }
}

/// Alias `ch` over `live_chats`.
impl Record for Chat {
  const COLUMNS: &'static str = "ch.chat_id, ch.kind, ch.title, ch.created_by, \
                                 ch.last_message_at, ch.created_at, ch.updated_at";

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(Chat {
      chat_id:         uuid_at(row, 0)?,
      kind:            enum_at::<ChatKind>(row, 1, "chat kind")?,
      title:           row.get(2)?,
      created_by:      uuid_at(row, 3)?,
      last_message_at: opt_dt_at(row, 4)?,
      created_at:      dt_at(row, 5)?,
      updated_at:      dt_at(row, 6)?,
    })
  }
}

/// Alias `cp` over `live_chat_participants`.
impl Record for Participant {
  const COLUMNS: &'static str = "cp.chat_id, cp.user_id, cp.role, cp.joined_at, cp.left_at";

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(Participant {
      chat_id:   uuid_at(row, 0)?,
      user_id:   uuid_at(row, 1)?,
      role:      enum_at::<ChatRole>(row, 2, "chat role")?,
      joined_at: dt_at(row, 3)?,
      left_at:   opt_dt_at(row, 4)?,
    })
  }
}

/// Alias `m` over `live_chat_messages`.
impl Record for Message {
  const COLUMNS: &'static str = "m.message_id, m.chat_id, m.sender_id, m.content, m.media, \
                                 m.created_at, m.updated_at";

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(Message {
      message_id: uuid_at(row, 0)?,
      chat_id:    uuid_at(row, 1)?,
      sender_id:  uuid_at(row, 2)?,
      content:    row.get(3)?,
      media:      decode_media(&row.get::<_, String>(4)?)?,
      created_at: dt_at(row, 5)?,
      updated_at: dt_at(row, 6)?,
    })
  }
}

/// Alias `n` over `live_notifications`.
impl Record for Notification {
  const COLUMNS: &'static str = "n.notification_id, n.owner_id, n.kind, n.payload, n.is_read, \
                                 n.created_at, n.updated_at";

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(Notification {
      notification_id: uuid_at(row, 0)?,
      owner_id:        uuid_at(row, 1)?,
      kind:            enum_at::<NotificationKind>(row, 2, "notification kind")?,
      payload:         serde_json::from_str(&row.get::<_, String>(3)?)?,
      read:            row.get(4)?,
      created_at:      dt_at(row, 5)?,
      updated_at:      dt_at(row, 6)?,
    })
  }
}
