//! clubhouse - A Discord bot for community clubs, countdowns, daily reminders
//! and feed notifications.
//!
//! This crate provides:
//! - Clubs, countdowns, weekly countdowns and per-user daily reminders
//! - Feed subscriptions (Nyaa, MangaDex, J-Novel Club) with role notifications

pub mod bot;
pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod model;
pub mod repository;
pub mod service;
pub mod subscriber;
pub mod task;
