//! LiteForum: a small categorized discussion board.
//!
//! Domain logic lives in plain async functions that take any sea-orm
//! connection, so integration tests can drive them against a private
//! database. The `web` module wires them to actix-web handlers.

pub mod admin;
pub mod app_config;
pub mod bbcode;
pub mod captcha;
pub mod constants;
pub mod create_user;
pub mod db;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod orm;
pub mod reactions;
pub mod session;
pub mod topics;
pub mod user;
pub mod web;
