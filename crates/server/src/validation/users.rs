//! User validation rules.

use vitrine_core::Email;

use super::{ValidationErrors, has_min_chars};
use crate::form::FormFields;
use crate::models::{NewUser, UserChanges};

pub const NAME_MESSAGE: &str = "O nome precisa ter mais que 2 caracteres";
pub const EMAIL_MESSAGE: &str = "Email inválido";
pub const PASSWORD_MESSAGE: &str = "A senha precisa ter mais que 6 caracteres";

const MIN_NAME_CHARS: usize = 2;
const MIN_PASSWORD_CHARS: usize = 6;

/// Validate a `POST /users` field set.
///
/// `name`, `email` and `password` are required. The password is checked in
/// plaintext; hashing happens afterwards.
///
/// # Errors
///
/// Returns every violated field with its message.
pub fn validate_user_create(fields: &FormFields) -> Result<NewUser, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = fields
        .get("name")
        .filter(|name| has_min_chars(name, MIN_NAME_CHARS));
    if name.is_none() {
        errors.add("name", NAME_MESSAGE);
    }

    let email = fields.get("email").and_then(|email| Email::parse(email).ok());
    if email.is_none() {
        errors.add("email", EMAIL_MESSAGE);
    }

    let password = fields
        .get("password")
        .filter(|password| has_min_chars(password, MIN_PASSWORD_CHARS));
    if password.is_none() {
        errors.add("password", PASSWORD_MESSAGE);
    }

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(NewUser {
            name: name.to_owned(),
            email,
            password: password.to_owned(),
            image: fields.get("image").map(str::to_owned),
        }),
        _ => Err(errors),
    }
}

/// Validate a `PATCH /users/{id}` field set.
///
/// Only fields present in the request are checked; absent ones are left out
/// of the returned changes.
///
/// # Errors
///
/// Returns every violated field with its message.
pub fn validate_user_patch(fields: &FormFields) -> Result<UserChanges, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut changes = UserChanges {
        image: fields.get("image").map(str::to_owned),
        ..UserChanges::default()
    };

    if let Some(name) = fields.get("name") {
        if has_min_chars(name, MIN_NAME_CHARS) {
            changes.name = Some(name.to_owned());
        } else {
            errors.add("name", NAME_MESSAGE);
        }
    }

    if let Some(email) = fields.get("email") {
        match Email::parse(email) {
            Ok(email) => changes.email = Some(email),
            Err(_) => errors.add("email", EMAIL_MESSAGE),
        }
    }

    if let Some(password) = fields.get("password") {
        if has_min_chars(password, MIN_PASSWORD_CHARS) {
            changes.password = Some(password.to_owned());
        } else {
            errors.add("password", PASSWORD_MESSAGE);
        }
    }

    if errors.is_empty() {
        Ok(changes)
    } else {
        Err(errors)
    }
}
