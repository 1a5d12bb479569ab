//! Error types for `agora-core`.

use strum::Display;
use thiserror::Error;

/// The kind of entity a [`Error::NotFound`] refers to.
///
/// Deliberately carries no identifier: callers learn *what* is missing, never
/// why (deleted, never existed, hidden by visibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
  User,
  Post,
  Comment,
  Reaction,
  Follow,
  Chat,
  Participant,
  Message,
  Notification,
}

#[derive(Debug, Error)]
pub enum Error {
  /// The entity does not exist, is soft-deleted, or is not visible to the
  /// caller.
  #[error("{0} not found")]
  NotFound(Entity),

  /// The caller is not permitted to perform the operation.
  #[error("forbidden: {0}")]
  Forbidden(String),

  /// The request violates a domain invariant.
  #[error("invalid operation: {0}")]
  InvalidOperation(String),

  /// Malformed input, rejected before any domain logic runs.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn forbidden(msg: impl Into<String>) -> Self { Self::Forbidden(msg.into()) }

  pub fn invalid(msg: impl Into<String>) -> Self {
    Self::InvalidOperation(msg.into())
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Recover the domain error, if any, from a backend error type.
///
/// Storage backends wrap [`Error`] alongside their own I/O failures; outer
/// layers use this to map domain failures to the right response.
pub trait DomainError: std::error::Error + Send + Sync + 'static {
  fn as_domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn as_domain(&self) -> Option<&Error> { Some(self) }
}
