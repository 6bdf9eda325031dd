//! Vitrine Core - Shared domain types.
//!
//! This crate provides the value types used across all Vitrine components:
//! - `server` - HTTP backend serving the `products` and `users` collections
//! - `cli` - Command-line tools for bootstrapping and seeding the store
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no store
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
