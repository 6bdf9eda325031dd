//! Vitrine server library.
//!
//! This crate provides the HTTP backend as a library, allowing the router to
//! be started in-process by tests and the store and validators to be reused
//! by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod upload;
pub mod validation;

pub use routes::app;
