use crate::domain::model::ObjectSummary;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Minimal object-storage surface every controller operation is built on.
///
/// Implementations must return listings in lexicographic key order and must
/// follow continuation tokens themselves, so callers always see every key
/// under the prefix.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()>;

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
    ) -> Result<()>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;
}
