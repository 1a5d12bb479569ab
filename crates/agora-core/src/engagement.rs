//! Comments, reactions and the per-page engagement aggregate.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result, post::Post};

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub post_id:    Uuid,
  pub author_id:  Uuid,
  pub content:    String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub fn validate_comment(content: &str) -> Result<()> {
  if content.trim().is_empty() {
    return Err(Error::validation("comment content is required"));
  }
  Ok(())
}

// ─── Reactions ───────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReactionKind {
  Like,
  Love,
  Haha,
  Wow,
  Sad,
  Angry,
}

/// A user's reaction to a post. At most one live reaction per (post, user);
/// changing the kind overwrites the existing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
  pub reaction_id: Uuid,
  pub post_id:     Uuid,
  pub user_id:     Uuid,
  pub kind:        ReactionKind,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

// ─── Engagement ──────────────────────────────────────────────────────────────

/// Batch-fetched engagement for one page of posts.
///
/// Posts without reactions or comments are simply absent from the maps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Engagement {
  pub reaction_counts: HashMap<Uuid, u64>,
  pub comment_counts:  HashMap<Uuid, u64>,
  /// Posts the viewer has live-reacted to with [`ReactionKind::Like`].
  pub liked:           HashSet<Uuid>,
}

impl Engagement {
  pub fn reactions(&self, post_id: Uuid) -> u64 {
    self.reaction_counts.get(&post_id).copied().unwrap_or(0)
  }

  pub fn comments(&self, post_id: Uuid) -> u64 {
    self.comment_counts.get(&post_id).copied().unwrap_or(0)
  }

  /// Attach the counts to each post, preserving order.
  pub fn annotate(&self, posts: Vec<Post>) -> Vec<PostView> {
    posts
      .into_iter()
      .map(|post| PostView {
        reaction_count: self.reactions(post.post_id),
        comment_count:  self.comments(post.post_id),
        liked:          self.liked.contains(&post.post_id),
        post,
      })
      .collect()
  }
}

/// A post as returned to readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
  #[serde(flatten)]
  pub post:           Post,
  pub reaction_count: u64,
  pub comment_count:  u64,
  pub liked:          bool,
}
