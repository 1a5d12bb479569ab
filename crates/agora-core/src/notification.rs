//! Notifications: typed records created as side effects of follows,
//! comments and messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
  Follow,
  Comment,
  Message,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  /// The recipient.
  pub owner_id:        Uuid,
  pub kind:            NotificationKind,
  /// Opaque to the store; shaped by whoever raised the notification.
  pub payload:         serde_json::Value,
  pub read:            bool,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// A notification waiting to be written.
///
/// Operations collect these while their transaction runs and hand them to the
/// outbox after commit, so a failed notification never fails the operation.
#[derive(Debug, Clone)]
pub struct PendingNotification {
  pub owner_id: Uuid,
  pub kind:     NotificationKind,
  pub payload:  serde_json::Value,
}

impl PendingNotification {
  pub fn followed(followee_id: Uuid, follower_id: Uuid) -> Self {
    Self {
      owner_id: followee_id,
      kind:     NotificationKind::Follow,
      payload:  serde_json::json!({ "follower_id": follower_id }),
    }
  }

  pub fn commented(post_author: Uuid, post_id: Uuid, comment_id: Uuid, author_id: Uuid) -> Self {
    Self {
      owner_id: post_author,
      kind:     NotificationKind::Comment,
      payload:  serde_json::json!({
        "post_id":    post_id,
        "comment_id": comment_id,
        "author_id":  author_id,
      }),
    }
  }

  pub fn messaged(recipient: Uuid, chat_id: Uuid, message_id: Uuid, sender_id: Uuid) -> Self {
    Self {
      owner_id: recipient,
      kind:     NotificationKind::Message,
      payload:  serde_json::json!({
        "chat_id":    chat_id,
        "message_id": message_id,
        "sender_id":  sender_id,
      }),
    }
  }
}
