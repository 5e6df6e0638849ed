//! Scriptbase's backend: handlers for a community site where users share script snippets, like and
//! download them, and discuss them on a forum.
//!
//! Each resource (`auth`, `scripts`, `forum`, `comments`) has a stateless handler in [`services`]
//! that maps one HTTP-shaped [`api::Event`] to one [`api::Response`], reading and writing through
//! the [`store`] traits. [`router`] serves the handlers over HTTP.

pub mod api;
pub mod config;
pub(crate) mod crypto;
pub mod db;
pub mod models;
pub mod router;
pub mod services;
pub mod store;
pub mod token;
