//! Business logic services.
//!
//! Services sit between route handlers and the store for work that is
//! neither validation nor persistence.

pub mod password;
