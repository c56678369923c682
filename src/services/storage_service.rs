use crate::error::{Error, Result};
use crate::models::application::FileRef;
use bytes::Bytes;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

const ALLOWED_EXTS: [&str; 9] = ["pdf", "doc", "docx", "txt", "rtf", "jpg", "jpeg", "png", "webp"];

/// Durable store for uploaded documents. Files live under the uploads root
/// and are served back via the static `/uploads` route; the returned
/// `public_id` is the path relative to that root.
#[derive(Clone)]
pub struct StorageService {
    root: String,
}

impl StorageService {
    pub fn new(root: String) -> Self {
        Self { root }
    }

    /// Persist an uploaded file under `<root>/<category>/`. Fails loudly:
    /// a transition must not commit a reference to a file that was never
    /// written.
    pub async fn store(&self, filename: &str, category: &str, data: &Bytes) -> Result<FileRef> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "bin".to_string());

        if !ALLOWED_EXTS.contains(&ext.as_str()) {
            return Err(Error::BadRequest(format!(
                "File type .{} is not allowed",
                ext
            )));
        }

        if ext == "pdf" && !data.starts_with(b"%PDF") {
            return Err(Error::BadRequest("Invalid PDF file content".into()));
        }
        if (ext == "jpg" || ext == "jpeg") && !data.starts_with(&[0xFF, 0xD8]) {
            return Err(Error::BadRequest("Invalid JPEG file content".into()));
        }
        if ext == "png" && !data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Err(Error::BadRequest("Invalid PNG file content".into()));
        }

        let dir = format!("{}/{}", self.root, category);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        let public_id = format!("{}/{}.{}", category, Uuid::new_v4(), ext);
        let file_path = format!("{}/{}", self.root, public_id);

        fs::write(&file_path, data).await.map_err(|e| {
            tracing::error!("Failed to write upload {}: {}", file_path, e);
            Error::Internal(format!("Failed to save file: {}", e))
        })?;

        Ok(FileRef {
            url: format!("/uploads/{}", public_id),
            public_id,
        })
    }

    pub async fn delete(&self, public_id: &str) -> Result<()> {
        let file_path = format!("{}/{}", self.root, public_id);
        fs::remove_file(&file_path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_disallowed_extension() {
        let svc = StorageService::new(std::env::temp_dir().display().to_string());
        let err = svc
            .store("payload.exe", "offer_letters", &Bytes::from_static(b"MZ"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains(".exe"));
    }

    #[tokio::test]
    async fn rejects_pdf_without_magic_bytes() {
        let svc = StorageService::new(std::env::temp_dir().display().to_string());
        let err = svc
            .store("letter.pdf", "offer_letters", &Bytes::from_static(b"hello"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid PDF"));
    }

    #[tokio::test]
    async fn stores_and_deletes_a_valid_file() {
        let root = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let svc = StorageService::new(root.display().to_string());
        let stored = svc
            .store("letter.pdf", "agreements", &Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap();
        assert!(stored.public_id.starts_with("agreements/"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.public_id));
        svc.delete(&stored.public_id).await.unwrap();
    }
}
