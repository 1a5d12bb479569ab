//! Core types, rules and trait definitions for the Agora social backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Visibility and conversation-authorization decisions live here as pure
//! functions; storage backends load records and apply them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod chat;
pub mod engagement;
pub mod error;
pub mod follow;
pub mod notification;
pub mod page;
pub mod post;
pub mod store;
pub mod user;

pub use error::{DomainError, Entity, Error, Result};
