//! Upload handling for write routes.
//!
//! [`UploadForm`] is the body extractor used by every create/update route.
//! It accepts `multipart/form-data`, `application/json` and
//! `application/x-www-form-urlencoded` bodies and yields a flat
//! [`FormFields`] set.
//!
//! For multipart bodies at most one file is accepted, under the `image`
//! field. It is streamed to `<upload_dir>/<epoch-millis>_<original-name>`
//! (`<epoch-millis>-<n>_<original-name>` if that name is taken) and its
//! generated filename is set as the `image` field before any validation
//! runs. If validation then fails, [`UploadForm::validate`] removes the file
//! again in the background.

use std::path::{Path, PathBuf};

use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request, multipart::Field},
    http::{StatusCode, header::CONTENT_TYPE},
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::Instrument;

use crate::error::AppError;
use crate::form::FormFields;
use crate::state::AppState;
use crate::validation::ValidationErrors;

/// Form field carrying the uploaded file.
pub const IMAGE_FIELD: &str = "image";

/// Fallback name when the client sent a file name with no usable component.
const FALLBACK_FILE_NAME: &str = "upload";

/// Counter suffixes tried after the plain name is taken.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Errors that can occur while reading a request body.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The body could not be decoded (bad multipart framing, invalid JSON,
    /// size limit exceeded, ...).
    #[error("{message}")]
    Body { status: StatusCode, message: String },

    /// A second file arrived in the same request.
    #[error("only one file may be uploaded per request")]
    TooManyFiles,

    /// A file arrived under a field other than `image`.
    #[error("unexpected file field: {0}")]
    UnexpectedFile(String),

    /// Writing the file to the upload directory failed.
    #[error("failed to store upload at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for UploadError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::Body {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

/// A file written to the upload directory by the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Generated name, as exposed in the record's `image` field.
    pub filename: String,
    /// Location on disk.
    pub path: PathBuf,
}

impl StoredUpload {
    /// Delete the file without waiting for it.
    ///
    /// Runs on a spawned task inside the caller's span; a failure is logged
    /// and never retried.
    pub fn discard(self) {
        let cleanup = async move {
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => tracing::debug!(path = %self.path.display(), "Discarded upload"),
                Err(e) => tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to delete rejected upload"
                ),
            }
        };
        tokio::spawn(cleanup.in_current_span());
    }
}

/// Request fields plus the file stored while reading them, if any.
#[derive(Debug)]
pub struct UploadForm {
    pub fields: FormFields,
    pub upload: Option<StoredUpload>,
}

impl UploadForm {
    /// Run a validator over the fields.
    ///
    /// On success the typed input is returned together with the stored file,
    /// which the caller still owns. On failure the file is discarded before
    /// the validation error is returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with every violated field.
    pub fn validate<T, F>(self, validator: F) -> Result<(T, Option<StoredUpload>), AppError>
    where
        F: FnOnce(&FormFields) -> Result<T, ValidationErrors>,
    {
        match validator(&self.fields) {
            Ok(input) => Ok((input, self.upload)),
            Err(errors) => {
                discard_upload(self.upload);
                Err(AppError::Validation(errors))
            }
        }
    }
}

/// Discard the request's upload, if there was one.
pub fn discard_upload(upload: Option<StoredUpload>) {
    if let Some(stored) = upload {
        stored.discard();
    }
}

impl FromRequest<AppState> for UploadForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| UploadError::Body {
                    status: e.status(),
                    message: e.body_text(),
                })?;
            return Ok(read_multipart(multipart, state.upload_dir()).await?);
        }

        if content_type.starts_with("application/json") {
            let Json(object) = Json::<serde_json::Map<String, serde_json::Value>>::from_request(
                req, state,
            )
            .await
            .map_err(|e| UploadError::Body {
                status: e.status(),
                message: e.body_text(),
            })?;
            return Ok(Self {
                fields: FormFields::from_json_object(object),
                upload: None,
            });
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| UploadError::Body {
                    status: e.status(),
                    message: e.body_text(),
                })?;
            return Ok(Self {
                fields: pairs.into_iter().collect(),
                upload: None,
            });
        }

        // No recognised body: every field is absent.
        Ok(Self {
            fields: FormFields::new(),
            upload: None,
        })
    }
}

/// Read all multipart fields, storing the `image` file if present.
///
/// Any error after the file was written removes it again.
async fn read_multipart(
    mut multipart: Multipart,
    upload_dir: &Path,
) -> Result<UploadForm, UploadError> {
    let mut upload = None;

    match collect_fields(&mut multipart, upload_dir, &mut upload).await {
        Ok(mut fields) => {
            // The generated name wins over any text field of the same name.
            if let Some(stored) = &upload {
                fields.insert(IMAGE_FIELD, stored.filename.clone());
            }
            Ok(UploadForm { fields, upload })
        }
        Err(e) => {
            discard_upload(upload);
            Err(e)
        }
    }
}

async fn collect_fields(
    multipart: &mut Multipart,
    upload_dir: &Path,
    upload: &mut Option<StoredUpload>,
) -> Result<FormFields, UploadError> {
    let mut fields = FormFields::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match field.file_name().map(str::to_owned) {
            // Browsers send an empty file name when no file was picked.
            Some(original) if original.is_empty() => {}
            Some(original) if name == IMAGE_FIELD => {
                if upload.is_some() {
                    return Err(UploadError::TooManyFiles);
                }
                *upload = Some(store_file(field, &original, upload_dir, Utc::now()).await?);
            }
            Some(_) => return Err(UploadError::UnexpectedFile(name)),
            None => {
                let value = field.text().await?;
                fields.insert(name, value);
            }
        }
    }

    Ok(fields)
}

/// Stream a multipart file into the upload directory.
///
/// The file is created exclusively; a name already taken by another upload
/// gets a counter after the millisecond prefix (`<millis>-1_<name>`). A
/// partially written file is removed.
async fn store_file(
    mut field: Field<'_>,
    original: &str,
    upload_dir: &Path,
    now: DateTime<Utc>,
) -> Result<StoredUpload, UploadError> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(UploadError::io(upload_dir))?;
    let (filename, path, mut file) = create_unique(upload_dir, now, original).await?;

    let written: Result<u64, UploadError> = async {
        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(UploadError::io(&path))?;
            size += chunk.len() as u64;
        }
        file.flush().await.map_err(UploadError::io(&path))?;
        Ok(size)
    }
    .await;

    match written {
        Ok(size) => {
            tracing::info!(filename = %filename, size, "Stored upload");
            Ok(StoredUpload { filename, path })
        }
        Err(e) => {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                tracing::error!(
                    path = %path.display(),
                    error = %remove_err,
                    "Failed to delete partial upload"
                );
            }
            Err(e)
        }
    }
}

/// Create a new file for the upload, adding a counter to the millisecond
/// prefix while the name is taken.
async fn create_unique(
    upload_dir: &Path,
    now: DateTime<Utc>,
    original: &str,
) -> Result<(String, PathBuf, tokio::fs::File), UploadError> {
    let mut attempt = 0;
    loop {
        let filename = upload_filename_attempt(now, original, attempt);
        let path = upload_dir.join(&filename);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((filename, path, file)),
            Err(e)
                if e.kind() == std::io::ErrorKind::AlreadyExists
                    && attempt < MAX_NAME_ATTEMPTS =>
            {
                attempt += 1;
            }
            Err(e) => return Err(UploadError::io(&path)(e)),
        }
    }
}

/// Generated filename: `<epoch-millis>_<final component of the client name>`.
#[must_use]
pub fn upload_filename(now: DateTime<Utc>, original: &str) -> String {
    upload_filename_attempt(now, original, 0)
}

fn upload_filename_attempt(now: DateTime<Utc>, original: &str, attempt: u32) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(FALLBACK_FILE_NAME);

    match attempt {
        0 => format!("{}_{base}", now.timestamp_millis()),
        n => format!("{}-{n}_{base}", now.timestamp_millis()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at_millis(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_upload_filename_prefixes_epoch_millis() {
        assert_eq!(
            upload_filename(at_millis(1_700_000_000_123), "foto.png"),
            "1700000000123_foto.png"
        );
    }

    #[test]
    fn test_upload_filename_strips_directories() {
        let now = at_millis(1);
        assert_eq!(upload_filename(now, "../../etc/passwd"), "1_passwd");
        assert_eq!(upload_filename(now, r"C:\Users\ana\foto.jpg"), "1_foto.jpg");
        assert_eq!(upload_filename(now, "dir/"), "1_upload");
        assert_eq!(upload_filename(now, ".."), "1_upload");
    }

    #[tokio::test]
    async fn test_create_unique_skips_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("5_foto.png"), b"first").unwrap();
        std::fs::write(dir.path().join("5-1_foto.png"), b"second").unwrap();

        let (filename, path, _file) = create_unique(dir.path(), at_millis(5), "foto.png")
            .await
            .unwrap();

        assert_eq!(filename, "5-2_foto.png");
        assert!(path.exists());
        assert_eq!(
            std::fs::read(dir.path().join("5_foto.png")).unwrap(),
            b"first"
        );
    }

    #[tokio::test]
    async fn test_discard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1_foto.png");
        std::fs::write(&path, b"png").unwrap();

        StoredUpload {
            filename: "1_foto.png".to_owned(),
            path: path.clone(),
        }
        .discard();

        for _ in 0..50 {
            if !path.exists() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("upload was not discarded");
    }

    #[tokio::test]
    async fn test_validate_failure_discards_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1_foto.png");
        std::fs::write(&path, b"png").unwrap();
        let form = UploadForm {
            fields: FormFields::new(),
            upload: Some(StoredUpload {
                filename: "1_foto.png".to_owned(),
                path: path.clone(),
            }),
        };

        let err = form
            .validate(crate::validation::validate_product_create)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref e) if e.get("price").is_some()));

        for _ in 0..50 {
            if !path.exists() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("upload was not discarded");
    }

    #[test]
    fn test_validate_success_hands_back_upload() {
        let upload = StoredUpload {
            filename: "1_foto.png".to_owned(),
            path: PathBuf::from("/nonexistent/1_foto.png"),
        };
        let form = UploadForm {
            fields: [("name", "Jo")].into_iter().collect(),
            upload: Some(upload.clone()),
        };

        let (changes, returned) = form
            .validate(crate::validation::validate_user_patch)
            .unwrap();
        assert_eq!(changes.name.as_deref(), Some("Jo"));
        assert_eq!(returned, Some(upload));
    }
}
