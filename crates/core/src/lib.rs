//! Hearty House Core - domain types and pure ordering logic.
//!
//! This crate provides the types and rules shared by every Hearty House
//! component:
//! - `bot` - Telegram ordering bot (customer checkout and staff admin)
//! - `cli` - Command-line tools for schema migration, menu import and reports
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no chat transport. Everything that depends on "now" takes the
//! current instant as an argument so it can be tested deterministically.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, phone numbers and statuses
//! - [`menu`] - Menu categories/items and the admin edit operations
//! - [`cart`] - Transient cart and its totals
//! - [`pricing`] - Delivery pricing policy
//! - [`schedule`] - Preparation time slots and restaurant open/closed status
//! - [`period`] - Order review periods and date input parsing
//! - [`pagination`] - Packing rendered blocks into bounded pages
//! - [`markup`] - Escaping user text for the HTML parse mode

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod markup;
pub mod menu;
pub mod pagination;
pub mod period;
pub mod pricing;
pub mod schedule;
pub mod types;

pub use types::*;
