//! Follow edges between users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// State of a follow edge. Only `Accepted` is ever produced; the other
/// variants are reserved for a follow-request approval flow.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FollowStatus {
  Pending,
  #[default]
  Accepted,
  Rejected,
}

/// A directed edge `follower -> followee`.
///
/// At most one row exists per pair; unfollowing soft-deletes it and
/// re-following resurrects the same row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
  pub follow_id:   Uuid,
  pub follower_id: Uuid,
  pub followee_id: Uuid,
  pub status:      FollowStatus,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Reject edges that can never exist.
pub fn check_follow(follower_id: Uuid, followee_id: Uuid) -> Result<()> {
  if follower_id == followee_id {
    return Err(Error::invalid("cannot follow yourself"));
  }
  Ok(())
}
