//! The request handlers, one per resource.
//!
//! Each handler takes the store it needs and an [`Event`](crate::api::Event), and makes at most
//! one store call per request.

pub mod auth;
pub mod comments;
pub mod forum;
pub mod scripts;
