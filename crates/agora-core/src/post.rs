//! Posts and the rules deciding who may see them.
//!
//! [`can_view`] is the single source of truth for visibility. The SQLite
//! backend pre-filters list queries with an equivalent predicate and then
//! re-checks every row through [`Viewer::can_view`], so the detail view and
//! the list views can never disagree.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Who may see a post.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
  #[default]
  Public,
  /// The author plus anyone holding an accepted follow edge to the author.
  Followers,
  /// The author alone.
  Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
  pub post_id:    Uuid,
  pub author_id:  Uuid,
  pub content:    Option<String>,
  /// Ordered media URLs.
  pub media:      Vec<String>,
  pub visibility: Visibility,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::SocialStore::create_post`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPost {
  pub content:    Option<String>,
  #[serde(default)]
  pub media:      Vec<String>,
  #[serde(default)]
  pub visibility: Visibility,
}

impl NewPost {
  pub fn validate(&self) -> Result<()> {
    validate_body(self.content.as_deref(), &self.media)
  }
}

/// Author-only edit of a post. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
  pub content:    Option<String>,
  pub media:      Option<Vec<String>>,
  pub visibility: Option<Visibility>,
}

impl PostPatch {
  /// Apply the patch to `post` in place, rejecting an edit that would leave
  /// the post with neither text nor media.
  pub fn apply(self, post: &mut Post) -> Result<()> {
    if let Some(content) = self.content {
      post.content = Some(content).filter(|c| !c.trim().is_empty());
    }
    if let Some(media) = self.media {
      post.media = media;
    }
    if let Some(visibility) = self.visibility {
      post.visibility = visibility;
    }
    validate_body(post.content.as_deref(), &post.media)
  }
}

/// Shared by posts and chat messages: at least one of text or media.
pub fn validate_body(content: Option<&str>, media: &[String]) -> Result<()> {
  let has_text = content.is_some_and(|c| !c.trim().is_empty());
  if !has_text && media.is_empty() {
    return Err(Error::validation("either content or media is required"));
  }
  if media.iter().any(|m| m.trim().is_empty()) {
    return Err(Error::validation("media URLs must not be empty"));
  }
  Ok(())
}

// ─── Visibility engine ───────────────────────────────────────────────────────

/// Decide whether `viewer` may see `post`.
///
/// `viewer_follows_author` must reflect a live, accepted follow edge from the
/// viewer to the post's author; it is ignored for anonymous viewers.
pub fn can_view(post: &Post, viewer: Option<Uuid>, viewer_follows_author: bool) -> bool {
  match post.visibility {
    Visibility::Public => true,
    Visibility::Private => viewer == Some(post.author_id),
    Visibility::Followers => match viewer {
      Some(id) => id == post.author_id || viewer_follows_author,
      None => false,
    },
  }
}

/// A viewer together with the set of authors they follow, for checking many
/// posts at once without a lookup per post.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
  pub user_id:   Option<Uuid>,
  pub followees: HashSet<Uuid>,
}

impl Viewer {
  pub fn anonymous() -> Self { Self::default() }

  pub fn new(user_id: Option<Uuid>, followees: HashSet<Uuid>) -> Self {
    Self { user_id, followees }
  }

  pub fn can_view(&self, post: &Post) -> bool {
    let follows = self.user_id.is_some() && self.followees.contains(&post.author_id);
    can_view(post, self.user_id, follows)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn post(author: Uuid, visibility: Visibility) -> Post {
    let now = Utc::now();
    Post {
      post_id: Uuid::new_v4(),
      author_id: author,
      content: Some("hello".into()),
      media: vec![],
      visibility,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn public_posts_are_visible_to_everyone() {
    let p = post(Uuid::new_v4(), Visibility::Public);
    assert!(can_view(&p, None, false));
    assert!(can_view(&p, Some(Uuid::new_v4()), false));
  }

  #[test]
  fn private_posts_are_visible_only_to_the_author() {
    let author = Uuid::new_v4();
    let p = post(author, Visibility::Private);
    assert!(can_view(&p, Some(author), false));
    // Following does not unlock private posts.
    assert!(!can_view(&p, Some(Uuid::new_v4()), true));
    assert!(!can_view(&p, None, false));
  }

  #[test]
  fn followers_posts_need_a_follow_edge() {
    let author = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let p = post(author, Visibility::Followers);
    assert!(can_view(&p, Some(author), false));
    assert!(!can_view(&p, Some(stranger), false));
    assert!(can_view(&p, Some(stranger), true));
  }

  #[test]
  fn anonymous_viewer_never_sees_followers_posts() {
    let p = post(Uuid::new_v4(), Visibility::Followers);
    assert!(!can_view(&p, None, true));
    assert!(!Viewer::anonymous().can_view(&p));
  }

  #[test]
  fn viewer_set_agrees_with_single_check() {
    let author = Uuid::new_v4();
    let me = Uuid::new_v4();
    let viewer = Viewer::new(Some(me), HashSet::from([author]));
    for vis in [Visibility::Public, Visibility::Followers, Visibility::Private] {
      let p = post(author, vis);
      assert_eq!(viewer.can_view(&p), can_view(&p, Some(me), true));
    }
  }

  #[test]
  fn patch_cannot_empty_a_post() {
    let mut p = post(Uuid::new_v4(), Visibility::Public);
    let patch = PostPatch { content: Some("   ".into()), ..Default::default() };
    assert!(matches!(patch.apply(&mut p), Err(Error::Validation(_))));
  }

  #[test]
  fn patch_updates_visibility() {
    let mut p = post(Uuid::new_v4(), Visibility::Public);
    let patch = PostPatch { visibility: Some(Visibility::Private), ..Default::default() };
    patch.apply(&mut p).unwrap();
    assert_eq!(p.visibility, Visibility::Private);
    assert_eq!(p.content.as_deref(), Some("hello"));
  }
}
