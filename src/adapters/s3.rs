use crate::config::toml_config::ConnectionConfig;
use crate::domain::model::ObjectSummary;
use crate::domain::ports::ObjectStore;
use crate::utils::error::{ControllerError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use url::Url;

const FALLBACK_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn from_client(client: S3Client) -> Self {
        Self { client }
    }

    /// Build a client from the default credential chain plus connection overrides.
    pub async fn connect(connection: &ConnectionConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &connection.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &connection.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(connection.force_path_style);
        if shared.region().is_none() {
            tracing::debug!("No region configured, falling back to {}", FALLBACK_REGION);
            builder = builder.region(Region::new(FALLBACK_REGION));
        }
        if let Some(endpoint) = &connection.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self::from_client(S3Client::from_conf(builder.build()))
    }
}

/// Service error codes S3 returns when the request was signed with bad or expired keys.
const CREDENTIAL_ERROR_CODES: [&str; 4] = [
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
];

/// True when any error in the chain comes from credential or identity resolution.
fn caused_by_missing_credentials(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if text.contains("credential") || text.contains("identity") {
            return true;
        }
        current = e.source();
    }
    false
}

fn map_sdk_error<E, R>(operation: &str, bucket: &str, key: &str, err: SdkError<E, R>) -> ControllerError
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();

    if let Some(code) = err.as_service_error().and_then(|e| e.code()) {
        if code == "NoSuchKey" || code == "NotFound" {
            return ControllerError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            };
        }
        if CREDENTIAL_ERROR_CODES.contains(&code) {
            return ControllerError::CredentialsError { message };
        }
    }

    let client_side = matches!(
        err,
        SdkError::ConstructionFailure(_) | SdkError::DispatchFailure(_)
    );
    if client_side && caused_by_missing_credentials(&err) {
        return ControllerError::CredentialsError { message };
    }

    ControllerError::StorageError {
        operation: operation.to_string(),
        bucket: bucket.to_string(),
        key: key.to_string(),
        message,
    }
}

/// `bucket/key` with the key percent-encoded segment by segment.
pub fn copy_source(bucket: &str, key: &str) -> Result<String> {
    let mut url = Url::parse("http://copy-source.invalid/").map_err(|e| {
        ControllerError::ProcessingError {
            message: format!("Failed to build copy source: {}", e),
        }
    })?;
    url.path_segments_mut()
        .map_err(|_| ControllerError::ProcessingError {
            message: "Copy source URL cannot hold path segments".to_string(),
        })?
        .clear()
        .extend(key.split('/'));
    Ok(format!("{}{}", bucket, url.path()))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix((!prefix.is_empty()).then(|| prefix.to_string()))
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        let mut page_count = 0usize;
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| map_sdk_error("list_objects_v2", bucket, prefix, e))?;
            page_count += 1;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    objects.push(ObjectSummary {
                        key: key.to_string(),
                        size: object.size().unwrap_or(0).max(0) as u64,
                    });
                }
            }
        }

        tracing::debug!(
            "Listed {} objects across {} pages in s3://{}/{}",
            objects.len(),
            page_count,
            bucket,
            prefix
        );
        Ok(objects)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error("get_object", bucket, key, e))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| ControllerError::StorageError {
                operation: "get_object".to_string(),
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: format!("Failed to collect S3 data: {}", e),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| map_sdk_error("put_object", bucket, key, e))?;
        Ok(())
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
    ) -> Result<()> {
        self.client
            .copy_object()
            .copy_source(copy_source(source_bucket, source_key)?)
            .bucket(target_bucket)
            .key(target_key)
            .send()
            .await
            .map_err(|e| map_sdk_error("copy_object", source_bucket, source_key, e))?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error("delete_object", bucket, key, e))?;
        Ok(())
    }
}
