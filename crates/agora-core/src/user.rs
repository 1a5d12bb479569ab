//! User accounts, the identity every other record hangs off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Account standing. Only `Active` accounts are produced today; `Suspended`
/// exists so moderation can be added without a schema change.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
  #[default]
  Active,
  Suspended,
}

/// A registered account. Credentials are never part of this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  pub email:        String,
  pub username:     String,
  pub display_name: Option<String>,
  pub bio:          Option<String>,
  pub status:       UserStatus,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::store::SocialStore::register_user`].
///
/// `password_hash` is an opaque PHC string; hashing happens at the edge.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub username:      String,
  pub password_hash: String,
  pub display_name:  Option<String>,
}

impl NewUser {
  pub fn validate(&self) -> Result<()> {
    validate_username(&self.username)?;
    validate_email(&self.email)?;
    if self.password_hash.is_empty() {
      return Err(Error::validation("password is required"));
    }
    Ok(())
  }
}

/// Partial update of a user's profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
  pub email:        Option<String>,
  pub username:     Option<String>,
  pub display_name: Option<String>,
  pub bio:          Option<String>,
}

impl UserPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(username) = &self.username {
      validate_username(username)?;
    }
    if let Some(email) = &self.email {
      validate_email(email)?;
    }
    Ok(())
  }
}

fn validate_username(username: &str) -> Result<()> {
  if username.is_empty() || username.len() > 32 {
    return Err(Error::validation("username must be 1-32 characters"));
  }
  if username.chars().any(char::is_whitespace) {
    return Err(Error::validation("username must not contain whitespace"));
  }
  Ok(())
}

fn validate_email(email: &str) -> Result<()> {
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
    _ => Err(Error::validation("email address is malformed")),
  }
}
