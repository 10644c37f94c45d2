use crate::core::scanner::{normalize_prefix, scan_files_in_bucket_by_regex, scan_files_including_regex};
use crate::domain::model::{file_name_of, KeyOption, LocalOption, RelocateMode, RelocationReport};
use crate::domain::ports::ObjectStore;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

fn local_target(folder: &Path, subfolder: Option<&str>) -> PathBuf {
    match subfolder {
        Some(sub) if !sub.is_empty() => folder.join(sub),
        _ => folder.to_path_buf(),
    }
}

/// Download every object matching `regex` into `local_folder[/local_subfolder]`.
///
/// Files are saved under their bare name; folder markers are skipped.
pub async fn download_files_from_s3<S>(
    store: &S,
    bucket: &str,
    regex: &str,
    local_folder: impl AsRef<Path>,
    bucket_prefix: &str,
    local_subfolder: Option<&str>,
) -> Result<Vec<PathBuf>>
where
    S: ObjectStore + ?Sized,
{
    let keys =
        scan_files_in_bucket_by_regex(store, bucket, bucket_prefix, regex, KeyOption::Key).await?;
    tracing::info!(
        "Found {} files in {} that match the regex pattern",
        keys.len(),
        bucket
    );

    let target_dir = local_target(local_folder.as_ref(), local_subfolder);
    tokio::fs::create_dir_all(&target_dir).await?;

    let mut saved = Vec::with_capacity(keys.len());
    for key in keys {
        if key.ends_with('/') {
            tracing::debug!("Skipping folder marker {}", key);
            continue;
        }
        tracing::info!("Downloading {}", key);
        let data = store.get_object(bucket, &key).await?;
        let local_path = target_dir.join(file_name_of(&key));
        tokio::fs::write(&local_path, data).await?;
        tracing::info!("Saved {}", local_path.display());
        saved.push(local_path);
    }

    Ok(saved)
}

/// Upload local files matching `regex`; returns the keys written.
pub async fn upload_files_to_s3<S>(
    store: &S,
    local_folder: impl AsRef<Path>,
    regex: &str,
    bucket: &str,
    bucket_prefix: Option<&str>,
    local_subfolder: Option<&str>,
) -> Result<Vec<String>>
where
    S: ObjectStore + ?Sized,
{
    let source_dir = local_target(local_folder.as_ref(), local_subfolder);
    let file_paths = scan_files_including_regex(&source_dir, regex, LocalOption::Path)?;

    if file_paths.is_empty() {
        tracing::info!(
            "No files found in {} that match the regex pattern",
            source_dir.display()
        );
        return Ok(Vec::new());
    }
    tracing::info!(
        "Found {} files in {} that match the regex pattern",
        file_paths.len(),
        source_dir.display()
    );

    let prefix = normalize_prefix(bucket_prefix.unwrap_or(""));
    let mut uploaded = Vec::with_capacity(file_paths.len());
    for file_path in file_paths {
        let file_name = Path::new(&file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = format!("{}{}", prefix, file_name);

        let data = tokio::fs::read(&file_path).await?;
        store.put_object(bucket, &key, data).await?;
        tracing::info!("Uploaded {} to s3://{}/{}", file_path, bucket, key);
        uploaded.push(key);
    }

    Ok(uploaded)
}

/// Target key for a relocated object.
///
/// With a source prefix, its first occurrence is swapped for the target
/// prefix; without one, the target prefix is prepended.
pub fn relocated_key(key: &str, source_prefix: &str, target_prefix: &str) -> String {
    if source_prefix.is_empty() {
        format!("{}{}", target_prefix, key)
    } else {
        key.replacen(source_prefix, target_prefix, 1)
    }
}

pub async fn relocate_files_between_buckets<S>(
    store: &S,
    source_bucket: &str,
    target_bucket: &str,
    regex: &str,
    source_prefix: &str,
    target_prefix: &str,
    mode: RelocateMode,
) -> Result<RelocationReport>
where
    S: ObjectStore + ?Sized,
{
    let keys =
        scan_files_in_bucket_by_regex(store, source_bucket, source_prefix, regex, KeyOption::Key)
            .await?;

    let mut report = RelocationReport::default();
    if keys.is_empty() {
        tracing::info!(
            "No files to relocate from bucket '{}' with prefix '{}'",
            source_bucket,
            source_prefix
        );
        return Ok(report);
    }

    for key in keys {
        let target_key = relocated_key(&key, source_prefix, target_prefix);

        let outcome = async {
            store
                .copy_object(source_bucket, &key, target_bucket, &target_key)
                .await?;
            tracing::info!("Copied file: {} to {}", key, target_key);
            if mode == RelocateMode::Move {
                store.delete_object(source_bucket, &key).await?;
                tracing::info!("Moved file: {} to {}", key, target_key);
            }
            Ok::<_, crate::utils::error::ControllerError>(())
        }
        .await;

        match outcome {
            Ok(()) => report.relocated.push((key, target_key)),
            Err(e) => {
                tracing::warn!("Failed to {} file {}: {}", mode, key, e);
                report.failed.push((key, e.to_string()));
            }
        }
    }

    Ok(report)
}

pub async fn copy_files_including_regex_between_s3_buckets<S>(
    store: &S,
    source_bucket: &str,
    target_bucket: &str,
    regex: &str,
    source_prefix: &str,
    target_prefix: &str,
) -> Result<RelocationReport>
where
    S: ObjectStore + ?Sized,
{
    relocate_files_between_buckets(
        store,
        source_bucket,
        target_bucket,
        regex,
        source_prefix,
        target_prefix,
        RelocateMode::Copy,
    )
    .await
}

/// Copy, then delete each source object whose copy succeeded.
pub async fn move_files_including_regex_between_s3_buckets<S>(
    store: &S,
    source_bucket: &str,
    target_bucket: &str,
    regex: &str,
    source_prefix: &str,
    target_prefix: &str,
) -> Result<RelocationReport>
where
    S: ObjectStore + ?Sized,
{
    relocate_files_between_buckets(
        store,
        source_bucket,
        target_bucket,
        regex,
        source_prefix,
        target_prefix,
        RelocateMode::Move,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relocated_key_replaces_first_prefix_occurrence() {
        assert_eq!(
            relocated_key("raw/2024/raw/a.csv", "raw/", "clean/"),
            "clean/2024/raw/a.csv"
        );
        assert_eq!(relocated_key("a.csv", "", "archive/"), "archive/a.csv");
        assert_eq!(relocated_key("raw/a.csv", "raw/", ""), "a.csv");
    }
}
