//! HTTP Basic-auth extractors backed by the store's argon2 password hashes.

use std::sync::Arc;

use agora_core::{store::SocialStore, user::User};
use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;

use crate::error::ApiError;

/// The authenticated caller. Rejects the request with 401 when credentials
/// are missing or wrong.
pub struct CurrentUser(pub User);

/// The caller if credentials were supplied. Anonymous requests pass through;
/// wrong credentials are still rejected.
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
  pub fn id(&self) -> Option<uuid::Uuid> { self.0.as_ref().map(|u| u.user_id) }
}

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Decode a `Basic` authorization header into `(username, password)`.
///
/// Returns `Ok(None)` when no header is present at all.
pub fn basic_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value.to_str().map_err(|_| ApiError::Unauthorized)?;
  let encoded = value.strip_prefix("Basic ").ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok(Some((username.to_owned(), password.to_owned())))
}

/// Resolve the caller from request headers.
pub async fn authenticate<S: SocialStore>(
  headers: &HeaderMap,
  store: &S,
) -> Result<Option<User>, ApiError> {
  let Some((username, password)) = basic_credentials(headers)? else {
    return Ok(None);
  };

  let (user, hash) = store
    .get_credentials(username)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&hash).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(Some(user))
}

impl<S> FromRequestParts<Arc<S>> for CurrentUser
where
  S: SocialStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, store: &Arc<S>) -> Result<Self, Self::Rejection> {
    authenticate(&parts.headers, store.as_ref())
      .await?
      .map(CurrentUser)
      .ok_or(ApiError::Unauthorized)
  }
}

impl<S> FromRequestParts<Arc<S>> for MaybeUser
where
  S: SocialStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, store: &Arc<S>) -> Result<Self, Self::Rejection> {
    Ok(MaybeUser(authenticate(&parts.headers, store.as_ref()).await?))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    map
  }

  #[test]
  fn decodes_basic_credentials() {
    let value = format!("Basic {}", B64.encode("alice:s3cr:et"));
    let creds = basic_credentials(&headers(&value)).unwrap().unwrap();
    assert_eq!(creds, ("alice".to_string(), "s3cr:et".to_string()));
  }

  #[test]
  fn missing_header_is_anonymous() {
    assert!(basic_credentials(&HeaderMap::new()).unwrap().is_none());
  }

  #[test]
  fn malformed_headers_are_unauthorized() {
    for value in ["Bearer abc", "Basic !!!not-base64!!!"] {
      assert!(matches!(
        basic_credentials(&headers(value)),
        Err(ApiError::Unauthorized)
      ));
    }
    let no_colon = format!("Basic {}", B64.encode("alice"));
    assert!(matches!(
      basic_credentials(&headers(&no_colon)),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn hashed_password_verifies() {
    let hash = hash_password("secret").unwrap();
    let parsed = PasswordHash::new(&hash).unwrap();
    assert!(Argon2::default().verify_password(b"secret", &parsed).is_ok());
    assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
  }
}
