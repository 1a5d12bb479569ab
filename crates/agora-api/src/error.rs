//! API error type and [`axum::response::IntoResponse`] implementation.

use agora_core::{DomainError, Error as CoreError};
use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error, surfacing its domain kind when it has one.
  pub fn store<E: DomainError>(err: E) -> Self {
    match err.as_domain() {
      Some(domain) => Self::domain(domain),
      None => Self::Store(Box::new(err)),
    }
  }

  fn domain(err: &CoreError) -> Self {
    match err {
      CoreError::NotFound(entity) => Self::NotFound(format!("{entity} not found")),
      CoreError::Forbidden(m) => Self::Forbidden(m.clone()),
      CoreError::InvalidOperation(m) => Self::Conflict(m.clone()),
      CoreError::Validation(m) => Self::BadRequest(m.clone()),
      CoreError::Serialization(e) => Self::Internal(e.to_string()),
    }
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self { Self::domain(&err) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
      }
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"agora\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use agora_core::Entity;

  use super::*;

  #[test]
  fn domain_kinds_map_to_statuses() {
    let cases = [
      (CoreError::NotFound(Entity::Chat), StatusCode::NOT_FOUND),
      (CoreError::forbidden("no"), StatusCode::FORBIDDEN),
      (CoreError::invalid("no"), StatusCode::CONFLICT),
      (CoreError::validation("no"), StatusCode::BAD_REQUEST),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::store(err).into_response().status(), status);
    }
  }

  #[test]
  fn unauthorized_carries_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}
