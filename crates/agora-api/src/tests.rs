//! Router-level tests against an in-memory SQLite store.

use std::sync::Arc;

use agora_store_sqlite::SqliteStore;
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

const PASSWORD: &str = "correct horse";

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

fn auth_header(user: &str, pass: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn call(
  app: &Router,
  method: &str,
  uri: &str,
  auth: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = auth {
    builder = builder.header(header::AUTHORIZATION, auth_header(user, PASSWORD));
  }
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  // Extractor rejections answer in plain text.
  let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, value)
}

/// Register `name` and return their id.
async fn register(app: &Router, name: &str) -> String {
  let (status, user) = call(
    app,
    "POST",
    "/users",
    None,
    Some(json!({
      "email": format!("{name}@example.com"),
      "username": name,
      "password": PASSWORD,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{user}");
  user["user_id"].as_str().unwrap().to_string()
}

// ── Health and accounts ─────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_open() {
  let app = app().await;
  let (status, body) = call(&app, "GET", "/health", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_then_fetch_and_reject_duplicates() {
  let app = app().await;
  let id = register(&app, "alice").await;

  let (status, user) = call(&app, "GET", &format!("/users/{id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(user["username"], "alice");
  assert!(user.get("password_hash").is_none());

  let (status, _) = call(
    &app,
    "POST",
    "/users",
    None,
    Some(json!({ "email": "other@example.com", "username": "alice", "password": "x" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = call(
    &app,
    "GET",
    "/users/00000000-0000-0000-0000-000000000000",
    None,
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
  let app = app().await;
  register(&app, "alice").await;

  let (status, _) = call(&app, "GET", "/feed", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let req = Request::builder()
    .uri("/users/me")
    .header(header::AUTHORIZATION, auth_header("alice", "wrong"))
    .body(Body::empty())
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

  let (status, me) = call(&app, "GET", "/users/me", Some("alice"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["username"], "alice");
}

// ── Posts and visibility ────────────────────────────────────────────────────

#[tokio::test]
async fn followers_post_needs_follow() {
  let app = app().await;
  let alice = register(&app, "alice").await;
  register(&app, "bob").await;

  let (status, post) = call(
    &app,
    "POST",
    "/posts",
    Some("alice"),
    Some(json!({ "content": "friends only", "visibility": "followers" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let uri = format!("/posts/{}", post["post_id"].as_str().unwrap());

  let (status, _) = call(&app, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = call(&app, "GET", &uri, Some("bob"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = call(&app, "POST", &format!("/users/{alice}/follow"), Some("bob"), None).await;
  assert_eq!(status, StatusCode::OK);

  let (status, view) = call(&app, "GET", &uri, Some("bob"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(view["content"], "friends only");
  assert_eq!(view["reaction_count"], 0);

  let (status, feed) = call(&app, "GET", "/feed", Some("bob"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(feed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn only_author_edits_post() {
  let app = app().await;
  register(&app, "alice").await;
  register(&app, "bob").await;

  let (_, post) = call(&app, "POST", "/posts", Some("alice"), Some(json!({ "content": "v1" }))).await;
  let uri = format!("/posts/{}", post["post_id"].as_str().unwrap());

  let patch = json!({ "content": "v2" });
  let (status, _) = call(&app, "PATCH", &uri, Some("bob"), Some(patch.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, edited) = call(&app, "PATCH", &uri, Some("alice"), Some(patch)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(edited["content"], "v2");
}

#[tokio::test]
async fn empty_post_and_oversized_page_are_bad_requests() {
  let app = app().await;
  register(&app, "alice").await;

  let (status, _) = call(&app, "POST", "/posts", Some("alice"), Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(&app, "GET", "/posts?page_size=101", None, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = call(&app, "GET", "/posts?page=0", None, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comments_and_reactions_feed_engagement() {
  let app = app().await;
  register(&app, "alice").await;
  register(&app, "bob").await;

  let (_, post) = call(&app, "POST", "/posts", Some("alice"), Some(json!({ "content": "hi" }))).await;
  let id = post["post_id"].as_str().unwrap().to_string();

  let (status, _) = call(
    &app,
    "POST",
    &format!("/posts/{id}/comments"),
    Some("bob"),
    Some(json!({ "content": "hello" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, _) = call(
    &app,
    "PUT",
    &format!("/posts/{id}/reaction"),
    Some("bob"),
    Some(json!({ "kind": "like" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, listed) = call(&app, "GET", "/posts", Some("bob"), None).await;
  let view = &listed.as_array().unwrap()[0];
  assert_eq!(view["comment_count"], 1);
  assert_eq!(view["reaction_count"], 1);
  assert_eq!(view["liked"], true);

  let (status, _) = call(
    &app,
    "PUT",
    &format!("/posts/{id}/reaction"),
    Some("bob"),
    Some(json!({ "kind": "applause" })),
  )
  .await;
  assert!(status.is_client_error());
}

// ── Chats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn group_chat_access_follows_participation() {
  let app = app().await;
  register(&app, "alice").await;
  let bob = register(&app, "bob").await;
  register(&app, "carol").await;

  let (status, chat) = call(
    &app,
    "POST",
    "/chats",
    Some("alice"),
    Some(json!({ "kind": "group", "title": "crew", "participant_ids": [bob] })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(chat["participants"].as_array().unwrap().len(), 2);
  let chat_uri = format!("/chats/{}", chat["chat_id"].as_str().unwrap());

  let (status, _) = call(&app, "GET", &chat_uri, Some("carol"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(
    &app,
    "POST",
    &format!("{chat_uri}/messages"),
    Some("bob"),
    Some(json!({ "content": "hi all" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, _) = call(
    &app,
    "DELETE",
    &format!("{chat_uri}/participants/{bob}"),
    Some("bob"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = call(
    &app,
    "POST",
    &format!("{chat_uri}/messages"),
    Some("bob"),
    Some(json!({ "content": "anyone?" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, messages) = call(&app, "GET", &format!("{chat_uri}/messages"), Some("alice"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(messages.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn direct_chat_rules() {
  let app = app().await;
  let alice = register(&app, "alice").await;
  let bob = register(&app, "bob").await;
  let carol = register(&app, "carol").await;

  let (status, _) = call(
    &app,
    "POST",
    "/chats",
    Some("alice"),
    Some(json!({ "kind": "direct", "participant_ids": [bob, carol] })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = call(
    &app,
    "POST",
    "/chats",
    Some("alice"),
    Some(json!({ "kind": "direct", "title": "us", "participant_ids": [bob] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, ab) = call(
    &app,
    "POST",
    "/chats",
    Some("alice"),
    Some(json!({ "kind": "direct", "participant_ids": [bob] })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, ba) = call(
    &app,
    "POST",
    "/chats",
    Some("bob"),
    Some(json!({ "kind": "direct", "participant_ids": [alice] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ab["chat_id"], ba["chat_id"]);

  let (status, _) = call(
    &app,
    "POST",
    &format!("/chats/{}/participants", ab["chat_id"].as_str().unwrap()),
    Some("alice"),
    Some(json!({ "user_id": carol })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn chat_title_patch_needs_explicit_field() {
  let app = app().await;
  register(&app, "alice").await;
  let bob = register(&app, "bob").await;

  let (_, chat) = call(
    &app,
    "POST",
    "/chats",
    Some("alice"),
    Some(json!({ "kind": "group", "title": "crew", "participant_ids": [bob] })),
  )
  .await;
  let chat_uri = format!("/chats/{}", chat["chat_id"].as_str().unwrap());

  let (status, _) = call(&app, "PATCH", &chat_uri, Some("alice"), Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (_, detail) = call(&app, "GET", &chat_uri, Some("alice"), None).await;
  assert_eq!(detail["title"], "crew");

  let (status, renamed) = call(
    &app,
    "PATCH",
    &chat_uri,
    Some("alice"),
    Some(json!({ "title": "crew two" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(renamed["title"], "crew two");

  let (status, cleared) = call(&app, "PATCH", &chat_uri, Some("alice"), Some(json!({ "title": null }))).await;
  assert_eq!(status, StatusCode::OK);
  assert!(cleared["title"].is_null());
}

// ── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn follow_notifies_and_read_all_clears() {
  let app = app().await;
  let alice = register(&app, "alice").await;
  register(&app, "bob").await;

  call(&app, "POST", &format!("/users/{alice}/follow"), Some("bob"), None).await;

  let (status, inbox) = call(&app, "GET", "/notifications?unread_only=true", Some("alice"), None).await;
  assert_eq!(status, StatusCode::OK);
  let inbox = inbox.as_array().unwrap();
  assert_eq!(inbox.len(), 1);
  assert_eq!(inbox[0]["kind"], "follow");

  let (status, body) = call(&app, "POST", "/notifications/read-all", Some("alice"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["updated"], 1);

  let (_, inbox) = call(&app, "GET", "/notifications?unread_only=true", Some("alice"), None).await;
  assert!(inbox.as_array().unwrap().is_empty());
}
