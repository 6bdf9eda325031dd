//! Seed the store from a YAML fixtures file.
//!
//! Each record goes through the same validators as the HTTP routes, and user
//! passwords are hashed before they are stored. Records that fail validation
//! are reported and skipped; the rest are still inserted.
//!
//! ```yaml
//! products:
//!   - name: Caneca
//!     price: 19.9
//!     description: Caneca de cerâmica
//! users:
//!   - name: Ana
//!     email: ana@example.com
//!     password: segredo123
//! ```

use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use vitrine_server::db::Store;
use vitrine_server::db::products::ProductRepository;
use vitrine_server::db::users::UserRepository;
use vitrine_server::form::FormFields;
use vitrine_server::services::password::hash_password;
use vitrine_server::validation::{ValidationErrors, validate_product_create, validate_user_create};

/// Fixtures file layout.
#[derive(Debug, Default, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub products: Vec<Map<String, Value>>,
    #[serde(default)]
    pub users: Vec<Map<String, Value>>,
}

/// A fixture entry that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub collection: &'static str,
    /// Position in its list, starting at 0.
    pub index: usize,
    pub fields: Vec<&'static str>,
}

impl Rejected {
    fn new(collection: &'static str, index: usize, errors: &ValidationErrors) -> Self {
        Self {
            collection,
            index,
            fields: errors.fields().collect(),
        }
    }
}

/// Outcome of a seeding run.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub products_created: usize,
    pub users_created: usize,
    pub rejected: Vec<Rejected>,
}

/// Seed the store at `db_path` from the fixtures file at `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the store
/// cannot be opened or written. Invalid records are not errors.
pub async fn run(file_path: &Path, db_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !file_path.exists() {
        return Err(format!("File not found: {}", file_path.display()).into());
    }

    info!(path = %file_path.display(), "Loading fixtures from file");
    let content = tokio::fs::read_to_string(file_path).await?;
    let fixtures: Fixtures = serde_yaml::from_str(&content)?;
    info!(
        products = fixtures.products.len(),
        users = fixtures.users.len(),
        "Parsed fixtures"
    );

    let store = Store::open(db_path).await?;
    let report = seed(&store, fixtures).await?;

    for rejected in &report.rejected {
        warn!(
            collection = rejected.collection,
            index = rejected.index,
            fields = ?rejected.fields,
            "Skipped invalid record"
        );
    }

    info!("Seeding complete:");
    info!("  Products created: {}", report.products_created);
    info!("  Users created: {}", report.users_created);
    info!("  Rejected: {}", report.rejected.len());

    Ok(())
}

/// Insert every valid fixture record into `store`.
///
/// # Errors
///
/// Returns an error if a password cannot be hashed or the store cannot be
/// written.
pub async fn seed(
    store: &Store,
    fixtures: Fixtures,
) -> Result<SeedReport, Box<dyn std::error::Error>> {
    let mut report = SeedReport::default();
    let now = Utc::now();

    let products = ProductRepository::new(store);
    for (index, object) in fixtures.products.into_iter().enumerate() {
        match validate_product_create(&FormFields::from_json_object(object)) {
            Ok(input) => {
                products.create(input, now).await?;
                report.products_created += 1;
            }
            Err(errors) => report.rejected.push(Rejected::new("products", index, &errors)),
        }
    }

    let users = UserRepository::new(store);
    for (index, object) in fixtures.users.into_iter().enumerate() {
        match validate_user_create(&FormFields::from_json_object(object)) {
            Ok(input) => {
                let password_hash = hash_password(&input.password)?;
                users.create(input, password_hash, now).await?;
                report.users_created += 1;
            }
            Err(errors) => report.rejected.push(Rejected::new("users", index, &errors)),
        }
    }

    Ok(report)
}
