//! Flat-file JSON document store.
//!
//! # Document: `db.json`
//!
//! A single JSON object holding every collection as an array of records
//! keyed by an integer `id`:
//!
//! ```json
//! { "products": [ { "id": 1, ... } ], "users": [ { "id": 1, ... } ] }
//! ```
//!
//! Top-level keys other than `products` and `users` are kept untouched.
//!
//! # Writes
//!
//! Every write is applied to a copy of the in-memory document, serialized to
//! `<path>.tmp` and renamed over the store file. The in-memory document is
//! only swapped once the rename succeeded, so a failed write leaves both the
//! file and the served state as they were. Writes are serialized by the
//! store lock; a handler's find → merge → assign sequence is not (last write
//! wins).

pub mod products;
pub mod users;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{Product, User};

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the store file failed.
    #[error("store I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file is not a valid document.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The document could not be serialized.
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Requested record was not found.
    #[error("not found")]
    NotFound,

    /// The collection already holds the largest representable ID.
    #[error("no ID left to allocate in {0}")]
    IdSpaceExhausted(&'static str),
}

impl StoreError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The whole store document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub users: Vec<User>,
    /// Collections this server does not manage.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// A record type living in one collection of the [`Document`].
pub trait Record: Clone + Send + Sync + 'static {
    /// Typed ID of the record.
    type Id: Copy + Eq + From<i32> + Into<i32> + Send + Sync;

    /// Collection name, used in logs.
    const COLLECTION: &'static str;

    /// The record's ID.
    fn id(&self) -> Self::Id;

    /// The collection this record type lives in.
    fn collection(document: &Document) -> &Vec<Self>;

    /// Mutable access to the collection.
    fn collection_mut(document: &mut Document) -> &mut Vec<Self>;
}

impl Record for Product {
    type Id = vitrine_core::ProductId;
    const COLLECTION: &'static str = "products";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn collection(document: &Document) -> &Vec<Self> {
        &document.products
    }

    fn collection_mut(document: &mut Document) -> &mut Vec<Self> {
        &mut document.products
    }
}

impl Record for User {
    type Id = vitrine_core::UserId;
    const COLLECTION: &'static str = "users";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn collection(document: &Document) -> &Vec<Self> {
        &document.users
    }

    fn collection_mut(document: &mut Document) -> &mut Vec<Self> {
        &mut document.users
    }
}

/// Handle to the JSON document store.
///
/// Shared through `AppState`; all access goes through the async lock.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    document: RwLock<Document>,
}

impl Store {
    /// Open the store at `path`, creating it with empty collections if missing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read or created.
    /// Returns `StoreError::DataCorruption` if the file is not a valid document.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let document = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => Document::default(),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| StoreError::DataCorruption(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(StoreError::io(parent))?;
                }
                let document = Document::default();
                persist(&path, &document).await?;
                tracing::info!(path = %path.display(), "Created empty store");
                document
            }
            Err(e) => return Err(StoreError::io(&path)(e)),
        };

        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a read-only closure against the current document.
    pub async fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&Document) -> R + Send,
    {
        let guard = self.document.read().await;
        f(&guard)
    }

    /// Apply `f` to a copy of the document and persist it.
    ///
    /// The served document only changes if both `f` and the file write succeed.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or `StoreError::Io`/`Encode` if the
    /// document cannot be written.
    pub async fn write<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Document) -> Result<R, StoreError> + Send,
        R: Send,
    {
        let mut guard = self.document.write().await;
        let mut next = guard.clone();
        let result = f(&mut next)?;
        persist(&self.path, &next).await?;
        *guard = next;
        Ok(result)
    }

    /// Find a record by ID.
    pub async fn find<T: Record>(&self, id: T::Id) -> Option<T> {
        self.read(|document| {
            T::collection(document)
                .iter()
                .find(|record| record.id() == id)
                .cloned()
        })
        .await
    }

    /// All records of a collection, in stored order.
    pub async fn list<T: Record>(&self) -> Vec<T> {
        self.read(|document| T::collection(document).clone()).await
    }

    /// Insert a record built around a freshly allocated ID.
    ///
    /// IDs are allocated as one past the highest ID in the collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IdSpaceExhausted` if the highest ID is `i32::MAX`.
    /// Returns `StoreError::Io`/`Encode` if the document cannot be written.
    pub async fn insert<T, F>(&self, build: F) -> Result<T, StoreError>
    where
        T: Record,
        F: FnOnce(T::Id) -> T + Send,
    {
        self.write(|document| {
            let records = T::collection_mut(document);
            let id = next_id::<T>(records)?;
            let record = build(id);
            records.push(record.clone());
            Ok(record)
        })
        .await
    }

    /// Replace the stored record that has the same ID as `record`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record has that ID.
    /// Returns `StoreError::Io`/`Encode` if the document cannot be written.
    pub async fn assign<T: Record>(&self, record: T) -> Result<T, StoreError> {
        self.write(|document| {
            let slot = T::collection_mut(document)
                .iter_mut()
                .find(|stored| stored.id() == record.id())
                .ok_or(StoreError::NotFound)?;
            *slot = record.clone();
            Ok(record)
        })
        .await
    }

    /// Remove a record by ID, returning it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record has that ID.
    /// Returns `StoreError::Io`/`Encode` if the document cannot be written.
    pub async fn remove<T: Record>(&self, id: T::Id) -> Result<T, StoreError> {
        self.write(|document| {
            let records = T::collection_mut(document);
            let index = records
                .iter()
                .position(|record| record.id() == id)
                .ok_or(StoreError::NotFound)?;
            Ok(records.remove(index))
        })
        .await
    }
}

fn next_id<T: Record>(records: &[T]) -> Result<T::Id, StoreError> {
    let max: i32 = records
        .iter()
        .map(|record| record.id().into())
        .max()
        .unwrap_or(0);
    max.checked_add(1)
        .map(T::Id::from)
        .ok_or(StoreError::IdSpaceExhausted(T::COLLECTION))
}

/// Write the document next to `path` and atomically move it into place.
async fn persist(path: &Path, document: &Document) -> Result<(), StoreError> {
    let mut json = serde_json::to_vec_pretty(document)?;
    json.push(b'\n');

    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &json)
        .await
        .map_err(StoreError::io(&tmp))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(StoreError::io(path))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use vitrine_core::{Price, ProductId};

    use super::*;
    use crate::models::ProductInput;

    fn input(name: &str) -> ProductInput {
        ProductInput {
            name: name.to_owned(),
            price: Price::parse("10").unwrap(),
            description: "Uma descrição longa".to_owned(),
            image: None,
        }
    }

    async fn insert_product(store: &Store, name: &str) -> Product {
        store
            .insert(|id| Product::create(id, input(name), Utc::now()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");

        let store = Store::open(&path).await.unwrap();

        assert!(path.exists());
        assert!(store.list::<Product>().await.is_empty());
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["products"], serde_json::json!([]));
        assert_eq!(raw["users"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_open_rejects_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Store::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::DataCorruption(_)));
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("db.json")).await.unwrap();

        let first = insert_product(&store, "Primeiro").await;
        let second = insert_product(&store, "Segundo").await;

        assert_eq!(first.id, ProductId::new(1));
        assert_eq!(second.id, ProductId::new(2));
        assert_eq!(
            store.find::<Product>(ProductId::new(2)).await.unwrap().name,
            "Segundo"
        );
    }

    #[tokio::test]
    async fn test_insert_after_max_id_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let max = Product::create(ProductId::new(i32::MAX), input("Ultimo"), Utc::now());
        let document = serde_json::json!({ "products": [max], "users": [] });
        std::fs::write(&path, document.to_string()).unwrap();
        let store = Store::open(&path).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = store
            .insert(|id| Product::create(id, input("Excedente"), Utc::now()))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::IdSpaceExhausted("products")));
        assert_eq!(store.list::<Product>().await.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("db.json")).await.unwrap();
        assert!(store.find::<Product>(ProductId::new(9)).await.is_none());
    }

    #[tokio::test]
    async fn test_assign_missing_is_not_found_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let store = Store::open(&path).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let ghost = Product::create(ProductId::new(5), input("Fantasma"), Utc::now());
        let err = store.assign(ghost).await.unwrap_err();

        assert!(matches!(err, StoreError::NotFound));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_writes_survive_reopen_and_keep_foreign_collections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, r#"{"products": [], "orders": [{"id": 1}]}"#).unwrap();

        let store = Store::open(&path).await.unwrap();
        let product = insert_product(&store, "Caneca").await;
        let mut renamed = product.clone();
        renamed.name = "Caneca azul".to_owned();
        store.assign(renamed).await.unwrap();
        drop(store);

        let reopened = Store::open(&path).await.unwrap();
        let stored = reopened.find::<Product>(product.id).await.unwrap();
        assert_eq!(stored.name, "Caneca azul");
        let orders = reopened
            .read(|document| document.other.get("orders").cloned())
            .await;
        assert_eq!(orders, Some(serde_json::json!([{"id": 1}])));
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("db.json")).await.unwrap();
        let product = insert_product(&store, "Vaso").await;

        let removed = store.remove::<Product>(product.id).await.unwrap();
        assert_eq!(removed.id, product.id);
        assert!(store.find::<Product>(product.id).await.is_none());
        assert!(matches!(
            store.remove::<Product>(product.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let store = Store::open(&path).await.unwrap();
        insert_product(&store, "Antes").await;

        // A directory squatting on the temp path makes the next write fail.
        std::fs::create_dir(dir.path().join("db.json.tmp")).unwrap();
        let result = store
            .insert(|id| Product::create(id, input("Depois"), Utc::now()))
            .await;

        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(store.list::<Product>().await.len(), 1);
    }
}
