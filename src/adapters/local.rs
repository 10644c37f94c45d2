use crate::domain::model::ObjectSummary;
use crate::domain::ports::ObjectStore;
use crate::utils::error::{ControllerError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

const FOLDER_MARKER: &str = ".s3-folder-marker";

/// Filesystem-backed store: `<root>/<bucket>/<key>`.
///
/// A key ending in `/` is stored as a directory holding a hidden marker file,
/// and only such directories are listed back as `prefix/` objects. Plain
/// directories exist only while they hold objects: deleting the last object
/// under one removes it, as S3 has no prefix left to show.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    base_path: PathBuf,
}

impl LocalObjectStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf> {
        let path = self.base_path.join(bucket);
        if !path.is_dir() {
            return Err(ControllerError::StorageError {
                operation: "open_bucket".to_string(),
                bucket: bucket.to_string(),
                key: String::new(),
                message: format!("NoSuchBucket: {} does not exist", path.display()),
            });
        }
        Ok(path)
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key
                .split('/')
                .any(|segment| segment == ".." || segment == FOLDER_MARKER)
        {
            return Err(ControllerError::InvalidArgument {
                message: format!("Invalid object key '{}'", key),
            });
        }
        Ok(self.bucket_path(bucket)?.join(key.trim_end_matches('/')))
    }
}

fn collect_keys(dir: &Path, prefix: &str, out: &mut Vec<ObjectSummary>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            let folder_key = format!("{}{}/", prefix, name);
            if path.join(FOLDER_MARKER).is_file() {
                out.push(ObjectSummary {
                    key: folder_key.clone(),
                    size: 0,
                });
            }
            collect_keys(&path, &folder_key, out)?;
        } else if file_type.is_file() && name != FOLDER_MARKER {
            out.push(ObjectSummary {
                key: format!("{}{}", prefix, name),
                size: entry.metadata()?.len(),
            });
        }
    }
    Ok(())
}

fn is_empty_dir(path: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Remove `start` and its ancestors while they are empty, stopping below `bucket_root`.
fn prune_empty_dirs(start: &Path, bucket_root: &Path) -> std::io::Result<()> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir == bucket_root || !dir.starts_with(bucket_root) || !dir.is_dir() {
            break;
        }
        if !is_empty_dir(dir)? {
            break;
        }
        fs::remove_dir(dir)?;
        current = dir.parent();
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let root = self.bucket_path(bucket)?;
        let mut objects = Vec::new();
        collect_keys(&root, "", &mut objects)?;
        objects.retain(|o| o.key.starts_with(prefix));
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        tracing::debug!(
            "Listed {} objects in local bucket '{}' with prefix '{}'",
            objects.len(),
            bucket,
            prefix
        );
        Ok(objects)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        if !path.is_file() {
            return Err(ControllerError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        Ok(fs::read(path)?)
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if key.ends_with('/') {
            fs::create_dir_all(&path)?;
            fs::write(path.join(FOLDER_MARKER), b"")?;
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, data)?;
        Ok(())
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        target_bucket: &str,
        target_key: &str,
    ) -> Result<()> {
        let data = self.get_object(source_bucket, source_key).await?;
        self.put_object(target_bucket, target_key, data).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        let bucket_root = self.bucket_path(bucket)?;

        let emptied = if key.ends_with('/') {
            let marker = path.join(FOLDER_MARKER);
            if marker.is_file() {
                fs::remove_file(marker)?;
            }
            Some(path.as_path())
        } else if path.is_file() {
            fs::remove_file(&path)?;
            path.parent()
        } else {
            None
        };

        if let Some(dir) = emptied {
            prune_empty_dirs(dir, &bucket_root)?;
        }
        Ok(())
    }
}
