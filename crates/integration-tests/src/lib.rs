//! Integration tests for Vitrine.
//!
//! Each test starts the full application router on an ephemeral port with
//! its own temporary store and public directory, then talks to it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vitrine-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tempfile::TempDir;

use vitrine_server::config::ServerConfig;
use vitrine_server::db::Store;
use vitrine_server::state::AppState;

/// A running server backed by a temporary directory.
///
/// The directory (and the server task's files) are removed on drop.
pub struct TestServer {
    pub client: Client,
    addr: SocketAddr,
    dir: TempDir,
}

impl TestServer {
    /// Start a server over an empty store.
    pub async fn start() -> Self {
        Self::start_with_document(None).await
    }

    /// Start a server whose store file initially holds `document`.
    pub async fn start_with_document(document: Option<&serde_json::Value>) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let public_dir = dir.path().join("public");
        let upload_dir = public_dir.join("images");
        std::fs::create_dir_all(&upload_dir).expect("Failed to create upload dir");

        let db_path = dir.path().join("db.json");
        if let Some(document) = document {
            std::fs::write(&db_path, document.to_string()).expect("Failed to write store");
        }

        let config = ServerConfig::from_lookup(|key| match key {
            "VITRINE_HOST" => Some("127.0.0.1".to_owned()),
            "VITRINE_PORT" => Some("0".to_owned()),
            "VITRINE_DB_PATH" => Some(db_path.display().to_string()),
            "VITRINE_PUBLIC_DIR" => Some(public_dir.display().to_string()),
            "VITRINE_UPLOAD_DIR" => Some(upload_dir.display().to_string()),
            _ => None,
        })
        .expect("Failed to build config");

        let store = Store::open(&config.db_path)
            .await
            .expect("Failed to open store");
        let listener = tokio::net::TcpListener::bind(config.socket_addr())
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let app = vitrine_server::app(AppState::new(config, store));
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            client: Client::new(),
            addr,
            dir,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Path of the store file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("db.json")
    }

    /// Directory served as static files.
    #[must_use]
    pub fn public_dir(&self) -> PathBuf {
        self.dir.path().join("public")
    }

    /// Directory uploads are written to.
    #[must_use]
    pub fn upload_dir(&self) -> PathBuf {
        self.public_dir().join("images")
    }

    /// The store file parsed as JSON.
    #[must_use]
    pub fn document(&self) -> serde_json::Value {
        let text = std::fs::read_to_string(self.db_path()).expect("Failed to read store");
        serde_json::from_str(&text).expect("Store is not valid JSON")
    }

    /// Names of the files currently in the upload directory.
    #[must_use]
    pub fn uploaded_files(&self) -> Vec<String> {
        list_files(&self.upload_dir())
    }

    /// Wait until the upload directory is empty.
    ///
    /// Rejected uploads are deleted in the background, after the response.
    pub async fn wait_for_empty_upload_dir(&self) -> bool {
        for _ in 0..100 {
            if self.uploaded_files().is_empty() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
