use crate::domain::model::{file_name_of, KeyOption, LocalOption};
use crate::domain::ports::ObjectStore;
use crate::utils::error::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Append a trailing `/` to a non-empty prefix.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

/// Keys (or file names) under `bucket_prefix` whose key matches `regex` anywhere.
///
/// The folder marker equal to the prefix itself is never returned.
pub async fn scan_files_in_bucket_by_regex<S>(
    store: &S,
    bucket: &str,
    bucket_prefix: &str,
    regex: &str,
    option: KeyOption,
) -> Result<Vec<String>>
where
    S: ObjectStore + ?Sized,
{
    let pattern = Regex::new(regex)?;
    let prefix = normalize_prefix(bucket_prefix);

    let keys: Vec<String> = store
        .list_objects(bucket, &prefix)
        .await?
        .into_iter()
        .filter(|object| object.key != prefix && pattern.is_match(&object.key))
        .map(|object| object.key)
        .collect();

    if keys.is_empty() {
        tracing::info!(
            "No files matching the regex '{}' found in the bucket '{}' with prefix '{}'",
            regex,
            bucket,
            bucket_prefix
        );
        return Ok(keys);
    }

    tracing::info!(
        "{} files matching the regex '{}' in the bucket '{}' with prefix '{}'",
        keys.len(),
        regex,
        bucket,
        bucket_prefix
    );

    Ok(match option {
        KeyOption::Key => keys,
        KeyOption::Name => keys.iter().map(|k| file_name_of(k).to_string()).collect(),
    })
}

/// Sorted regular files directly inside `folder` whose name matches `regex`.
pub fn scan_files_including_regex(
    folder: impl AsRef<Path>,
    regex: &str,
    option: LocalOption,
) -> Result<Vec<String>> {
    let folder = folder.as_ref();
    let pattern = Regex::new(regex)?;

    let mut names = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if pattern.is_match(&name) {
            names.push(name);
        }
    }

    let mut result: Vec<String> = match option {
        LocalOption::Name => names,
        LocalOption::Path => names
            .iter()
            .map(|name| folder.join(name).to_string_lossy().into_owned())
            .collect(),
    };
    result.sort();
    Ok(result)
}
