//! Hearty House ordering bot library.
//!
//! This crate provides the Telegram bot as a library, so the conversation
//! logic can be driven from integration tests with a fake transport.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`db`] - `SQLite` repositories for menu, users and orders
//! - [`handlers`] - The conversation state machine
//! - [`views`] - Rendering of every screen
//! - [`transport`] - Outbound chat boundary and retry wrapper
//! - [`telegram`] - teloxide adapter and dispatcher

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod telegram;
pub mod transport;
pub mod views;
