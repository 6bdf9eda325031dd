//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{Value, json};

use vitrine_core::ProductId;

use crate::db::StoreError;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;
use crate::upload::{UploadForm, discard_upload};
use crate::validation::{validate_product_create, validate_product_update};

/// Message returned when `PUT /products/{id}` targets a missing product.
pub const PRODUCT_NOT_FOUND: &str = "Produto não encontrado";

/// List all products.
pub async fn index(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(ProductRepository::new(state.store()).list().await)
}

/// Show a single product.
///
/// # Errors
///
/// Returns 404 if the ID is not numeric or no product has it.
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    let id = id.parse::<ProductId>().map_err(|_| StoreError::NotFound)?;
    let product = ProductRepository::new(state.store())
        .get_by_id(id)
        .await
        .ok_or(StoreError::NotFound)?;
    Ok(Json(product))
}

/// Create a product.
///
/// Validates with the create rules, stamps `createdAt` and answers 201 with
/// the stored record.
///
/// # Errors
///
/// Returns 400 with the field errors, or 500 if the store cannot be written.
pub async fn create(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<(StatusCode, Json<Product>)> {
    let (input, upload) = form.validate(validate_product_create)?;

    let product = ProductRepository::new(state.store())
        .create(input, Utc::now())
        .await
        .map_err(|e| {
            discard_upload(upload);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's fields.
///
/// The whole payload is validated first, independently of what is stored.
/// The validated fields are then merged over the stored record and
/// `updatedAt` is stamped.
///
/// # Errors
///
/// Returns 400 with the field errors, 404 if the product does not exist
/// (nothing is written), or 500 if the store cannot be written.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: UploadForm,
) -> Result<Json<Product>> {
    let (input, upload) = form.validate(validate_product_update)?;
    let products = ProductRepository::new(state.store());

    let result: Result<Product> = async {
        let id = id
            .parse::<ProductId>()
            .map_err(|_| AppError::NotFound(PRODUCT_NOT_FOUND))?;
        let existing = products
            .get_by_id(id)
            .await
            .ok_or(AppError::NotFound(PRODUCT_NOT_FOUND))?;

        products
            .assign(existing.merge(input, Utc::now()))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AppError::NotFound(PRODUCT_NOT_FOUND),
                other => other.into(),
            })
    }
    .await;

    match result {
        Ok(product) => Ok(Json(product)),
        Err(e) => {
            discard_upload(upload);
            Err(e)
        }
    }
}

/// Delete a product.
///
/// # Errors
///
/// Returns 404 if there is no such product, or 500 if the store cannot be
/// written.
pub async fn destroy(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let id = id.parse::<ProductId>().map_err(|_| StoreError::NotFound)?;
    ProductRepository::new(state.store()).delete(id).await?;
    Ok(Json(json!({})))
}
