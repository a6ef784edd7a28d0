//! Design image file storage.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Stores an uploaded blob and returns the reference kept on the order.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DesignStorage: Send + Sync {
    async fn store(&self, original_name: Option<String>, bytes: Vec<u8>) -> AppResult<String>;
}

/// Writes images into a local directory served under the uploads route.
#[derive(Debug, Clone)]
pub struct LocalDesignStorage {
    root: PathBuf,
}

impl LocalDesignStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DesignStorage for LocalDesignStorage {
    async fn store(&self, original_name: Option<String>, bytes: Vec<u8>) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::validation("Uploaded image is empty"));
        }

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::internal(format!("Cannot create {}: {}", self.root.display(), e))
        })?;

        let file = design_file_name(
            chrono::Utc::now().timestamp_millis(),
            Uuid::new_v4(),
            original_name.as_deref(),
        );
        let path = self.root.join(&file);
        let write_err = |e: std::io::Error| {
            AppError::internal(format!("Cannot write {}: {}", path.display(), e))
        };

        // Never replace an image another order already references
        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(write_err)?;
        out.write_all(&bytes).await.map_err(write_err)?;
        out.flush().await.map_err(write_err)?;

        tracing::info!(file = %file, size = bytes.len(), "Stored design image");
        Ok(file)
    }
}

/// `design_<millis>_<token><ext>`, keeping only a short alphanumeric
/// extension from the client-supplied name.
fn design_file_name(millis: i64, token: Uuid, original_name: Option<&str>) -> String {
    let ext = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("design_{}_{}{}", millis, token.simple(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_design_file_name() {
        let token = Uuid::nil();
        assert_eq!(
            design_file_name(1700000000000, token, Some("Front.PNG")),
            "design_1700000000000_00000000000000000000000000000000.png"
        );
        assert_eq!(design_file_name(42, token, None), "design_42_00000000000000000000000000000000");
        assert!(!design_file_name(42, token, Some("../../etc/passwd")).contains('.'));
        assert!(!design_file_name(42, token, Some("x.p/ng")).contains('.'));
        assert_ne!(
            design_file_name(42, Uuid::new_v4(), None),
            design_file_name(42, Uuid::new_v4(), None)
        );
    }

    #[tokio::test]
    async fn test_concurrent_uploads_keep_both_files() {
        let root = std::env::temp_dir().join(format!("designs-{}", Uuid::new_v4()));
        let storage = LocalDesignStorage::new(&root);

        let (a, b) = tokio::join!(
            storage.store(Some("a.png".into()), vec![1]),
            storage.store(Some("b.png".into()), vec![2]),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a, b);
        assert_eq!(tokio::fs::read(root.join(&a)).await.unwrap(), vec![1]);
        assert_eq!(tokio::fs::read(root.join(&b)).await.unwrap(), vec![2]);
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_store_writes_into_root() {
        let root = std::env::temp_dir().join(format!("designs-{}", Uuid::new_v4()));
        let storage = LocalDesignStorage::new(&root);

        let file = storage
            .store(Some("art.jpg".into()), vec![1, 2, 3])
            .await
            .unwrap();

        assert!(file.starts_with("design_") && file.ends_with(".jpg"));
        assert_eq!(tokio::fs::read(root.join(&file)).await.unwrap(), vec![1, 2, 3]);
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_store_rejects_empty_blob() {
        let storage = LocalDesignStorage::new(std::env::temp_dir());
        assert!(matches!(
            storage.store(None, Vec::new()).await,
            Err(AppError::Validation(_))
        ));
    }
}
