//! Domain models for the stored collections.
//!
//! Records are the exact shape persisted in the JSON store; the `*Input`
//! and `*Changes` types are what the validators hand to route handlers.

pub mod product;
pub mod user;

pub use product::{Product, ProductInput};
pub use user::{NewUser, User, UserChanges};
