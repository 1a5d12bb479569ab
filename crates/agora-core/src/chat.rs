//! Chats, their participants and messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatKind {
  /// Exactly two participants, fixed for the life of the chat.
  Direct,
  Group,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
  Owner,
  Admin,
  Member,
}

impl ChatRole {
  /// Owners and admins may manage group membership and metadata.
  pub fn can_manage(self) -> bool { matches!(self, Self::Owner | Self::Admin) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
  pub chat_id:         Uuid,
  pub kind:            ChatKind,
  pub title:           Option<String>,
  pub created_by:      Uuid,
  /// Denormalised for ordering a user's chat list by recent activity.
  pub last_message_at: Option<DateTime<Utc>>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// A user's membership in a chat. `left_at` set means the user left (or was
/// removed) and may no longer read or write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
  pub chat_id:   Uuid,
  pub user_id:   Uuid,
  pub role:      ChatRole,
  pub joined_at: DateTime<Utc>,
  pub left_at:   Option<DateTime<Utc>>,
}

impl Participant {
  pub fn is_active(&self) -> bool { self.left_at.is_none() }
}

/// A chat together with its currently active participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDetail {
  #[serde(flatten)]
  pub chat:         Chat,
  pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id: Uuid,
  pub chat_id:    Uuid,
  pub sender_id:  Uuid,
  pub content:    Option<String>,
  pub media:      Vec<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::SocialStore::send_message`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMessage {
  pub content: Option<String>,
  #[serde(default)]
  pub media:   Vec<String>,
}

impl NewMessage {
  pub fn validate(&self) -> Result<()> {
    crate::post::validate_body(self.content.as_deref(), &self.media)
  }
}

// ─── Creation planning ───────────────────────────────────────────────────────

/// Resolve the other party of a direct chat from a creation request's
/// participant list.
///
/// The creator may or may not list themselves; exactly one other user must
/// remain.
pub fn direct_counterpart(creator: Uuid, participant_ids: &[Uuid]) -> Result<Uuid> {
  let mut others: Vec<Uuid> = participant_ids
    .iter()
    .copied()
    .filter(|id| *id != creator)
    .collect();
  others.sort();
  others.dedup();

  match others.as_slice() {
    [other] => Ok(*other),
    [] => Err(Error::invalid("cannot start a direct chat with yourself")),
    _ => Err(Error::invalid(
      "a direct chat requires exactly one other participant",
    )),
  }
}

/// Normalise a group chat's initial member list: the creator is dropped (they
/// join as owner) and duplicates are removed, keeping first-seen order.
pub fn group_members(creator: Uuid, participant_ids: &[Uuid]) -> Vec<Uuid> {
  let mut members: Vec<Uuid> = Vec::with_capacity(participant_ids.len());
  for id in participant_ids {
    if *id != creator && !members.contains(id) {
      members.push(*id);
    }
  }
  members
}

/// Canonical key for the unordered pair of a direct chat, so `(a, b)` and
/// `(b, a)` map to the same chat.
pub fn direct_key(a: Uuid, b: Uuid) -> String {
  let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
  format!("{lo}:{hi}")
}
