//! Bootstrap an empty store.

use std::path::Path;

use tracing::info;

use vitrine_server::db::Store;

/// Create the store file (if missing) and the upload directory.
///
/// An existing store is opened to check it parses and is left unchanged.
///
/// # Errors
///
/// Returns an error if the store is malformed or a path cannot be created.
pub async fn run(db_path: &Path, upload_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(db_path).await?;
    let (products, users) = store
        .read(|document| (document.products.len(), document.users.len()))
        .await;
    info!(
        path = %db_path.display(),
        products,
        users,
        "Store ready"
    );

    tokio::fs::create_dir_all(upload_dir).await?;
    info!(path = %upload_dir.display(), "Upload directory ready");

    Ok(())
}
