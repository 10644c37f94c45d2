use crate::core::scanner::normalize_prefix;
use crate::domain::ports::ObjectStore;
use crate::utils::error::{ControllerError, Result};

/// Create a zero-byte `subfolder/` object; returns the marker key.
pub async fn create_subfolder_in_bucket<S>(store: &S, bucket: &str, bucket_subfolder: &str) -> Result<String>
where
    S: ObjectStore + ?Sized,
{
    if bucket_subfolder.trim_matches('/').is_empty() {
        return Err(ControllerError::InvalidArgument {
            message: "Subfolder name cannot be empty".to_string(),
        });
    }

    let key = normalize_prefix(bucket_subfolder);
    store.put_object(bucket, &key, Vec::new()).await?;
    tracing::info!("Subfolder '{}' created in bucket '{}'", key, bucket);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalObjectStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_subfolder_appends_slash() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("reports")).unwrap();
        let store = LocalObjectStore::new(dir.path());

        let key = create_subfolder_in_bucket(&store, "reports", "2024/q1").await.unwrap();
        assert_eq!(key, "2024/q1/");
        assert!(dir.path().join("reports/2024/q1").is_dir());

        let listed = store.list_objects("reports", "").await.unwrap();
        assert_eq!(listed[0].key, "2024/q1/");
    }

    #[tokio::test]
    async fn test_create_subfolder_rejects_empty_name() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let err = create_subfolder_in_bucket(&store, "reports", "/").await.unwrap_err();
        assert!(matches!(err, ControllerError::InvalidArgument { .. }));
    }
}
