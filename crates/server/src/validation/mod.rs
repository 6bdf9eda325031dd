//! Field validation for write routes.
//!
//! Validators turn a [`FormFields`](crate::form::FormFields) set into a typed
//! input or a [`ValidationErrors`] map of field name to message. Every rule
//! runs; violations are collected, never short-circuited. Messages are in
//! Portuguese, as returned to API clients.

pub mod products;
pub mod users;

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

pub use products::{validate_product_create, validate_product_update};
pub use users::{validate_user_create, validate_user_patch};

/// Field name → message map returned as a 400 body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("validation failed for {} field(s)", .0.len())]
pub struct ValidationErrors(BTreeMap<&'static str, &'static str>);

impl ValidationErrors {
    /// Create an empty error map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field`.
    pub fn add(&mut self, field: &'static str, message: &'static str) {
        self.0.insert(field, message);
    }

    /// Whether no violation was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The message recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    /// Fields with a violation, in name order.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

/// Length check in Unicode scalar values.
fn has_min_chars(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}
