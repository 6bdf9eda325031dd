//! Product validation rules.

use vitrine_core::Price;

use super::{ValidationErrors, has_min_chars};
use crate::form::FormFields;
use crate::models::ProductInput;

pub const NAME_MESSAGE: &str = "O nome do produto precisa ter mais que 2 caracteres";
pub const PRICE_MESSAGE: &str = "Preço inválido";
pub const DESCRIPTION_MESSAGE: &str = "A descrição precisa ter mais que 10 caracteres";

const MIN_NAME_CHARS: usize = 2;
const MIN_DESCRIPTION_CHARS: usize = 10;

/// Validate a `POST /products` field set.
///
/// `name`, `price` and `description` are all required.
///
/// # Errors
///
/// Returns every violated field with its message.
pub fn validate_product_create(fields: &FormFields) -> Result<ProductInput, ValidationErrors> {
    validate_full_payload(fields)
}

/// Validate a `PUT /products/{id}` field set.
///
/// Replacement uses the create rules unchanged: all three fields must be in
/// the request, the stored record is never consulted.
///
/// # Errors
///
/// Returns every violated field with its message.
pub fn validate_product_update(fields: &FormFields) -> Result<ProductInput, ValidationErrors> {
    validate_full_payload(fields)
}

fn validate_full_payload(fields: &FormFields) -> Result<ProductInput, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = fields
        .get("name")
        .filter(|name| has_min_chars(name, MIN_NAME_CHARS));
    if name.is_none() {
        errors.add("name", NAME_MESSAGE);
    }

    let price = fields
        .get("price")
        .and_then(|price| Price::parse(price).ok());
    if price.is_none() {
        errors.add("price", PRICE_MESSAGE);
    }

    let description = fields
        .get("description")
        .filter(|description| has_min_chars(description, MIN_DESCRIPTION_CHARS));
    if description.is_none() {
        errors.add("description", DESCRIPTION_MESSAGE);
    }

    match (name, price, description) {
        (Some(name), Some(price), Some(description)) if errors.is_empty() => Ok(ProductInput {
            name: name.to_owned(),
            price,
            description: description.to_owned(),
            image: fields.get("image").map(str::to_owned),
        }),
        _ => Err(errors),
    }
}
