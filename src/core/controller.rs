use crate::config::toml_config::SpecialConfig;
use crate::core::{dataframe_reader, scanner, special_operations, structure, transfer};
use crate::domain::model::{DataFrame, KeyOption, MergeOutcome, RelocateMode, RelocationReport};
use crate::domain::ports::ObjectStore;
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// One entry point over every bucket operation, bound to a single store.
pub struct S3Controller<S: ObjectStore + ?Sized> {
    special: SpecialConfig,
    store: Box<S>,
}

impl<S: ObjectStore + ?Sized> S3Controller<S> {
    pub fn new(store: Box<S>) -> Self {
        Self::with_special_config(store, SpecialConfig::default())
    }

    pub fn with_special_config(store: Box<S>, special: SpecialConfig) -> Self {
        Self { special, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn scan(
        &self,
        bucket: &str,
        prefix: &str,
        regex: &str,
        option: KeyOption,
    ) -> Result<Vec<String>> {
        scanner::scan_files_in_bucket_by_regex(self.store(), bucket, prefix, regex, option).await
    }

    pub async fn download(
        &self,
        bucket: &str,
        regex: &str,
        local_folder: &Path,
        prefix: &str,
        local_subfolder: Option<&str>,
    ) -> Result<Vec<PathBuf>> {
        transfer::download_files_from_s3(self.store(), bucket, regex, local_folder, prefix, local_subfolder)
            .await
    }

    pub async fn upload(
        &self,
        local_folder: &Path,
        regex: &str,
        bucket: &str,
        prefix: Option<&str>,
        local_subfolder: Option<&str>,
    ) -> Result<Vec<String>> {
        transfer::upload_files_to_s3(self.store(), local_folder, regex, bucket, prefix, local_subfolder)
            .await
    }

    pub async fn relocate(
        &self,
        source_bucket: &str,
        target_bucket: &str,
        regex: &str,
        source_prefix: &str,
        target_prefix: &str,
        mode: RelocateMode,
    ) -> Result<RelocationReport> {
        transfer::relocate_files_between_buckets(
            self.store(),
            source_bucket,
            target_bucket,
            regex,
            source_prefix,
            target_prefix,
            mode,
        )
        .await
    }

    pub async fn read_csv(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        file_name: Option<&str>,
        file_key: Option<&str>,
    ) -> Result<DataFrame> {
        dataframe_reader::open_df_in_bucket(self.store(), bucket, prefix, file_name, file_key).await
    }

    pub async fn read_csv_by_regex(
        &self,
        bucket: &str,
        prefix: &str,
        regex: &str,
        index: isize,
    ) -> Result<DataFrame> {
        dataframe_reader::open_df_in_bucket_by_regex(self.store(), bucket, prefix, regex, index).await
    }

    pub async fn read_excel(&self, bucket: &str, prefix: &str, file_name: &str) -> Result<DataFrame> {
        dataframe_reader::open_excel_in_bucket(self.store(), bucket, prefix, file_name).await
    }

    pub async fn read_excel_by_regex(&self, bucket: &str, prefix: &str, regex: &str) -> Result<DataFrame> {
        dataframe_reader::open_excel_in_bucket_by_regex(self.store(), bucket, prefix, regex).await
    }

    pub async fn create_subfolder(&self, bucket: &str, subfolder: &str) -> Result<String> {
        structure::create_subfolder_in_bucket(self.store(), bucket, subfolder).await
    }

    pub async fn locate_menu_datasets(
        &self,
        request: &special_operations::MenuDatasetRequest,
        today: NaiveDate,
        local_root: &Path,
    ) -> Result<Vec<PathBuf>> {
        special_operations::locate_menu_datasets(
            self.store(),
            &self.special.dataset_bucket,
            request,
            today,
            local_root,
        )
        .await
    }

    /// Local-only; dates are read from the configured date column.
    pub fn merge_timeseries(
        &self,
        old_path: &Path,
        new_path: &Path,
        file_name_save: Option<String>,
        file_folder_save: Option<PathBuf>,
        today: NaiveDate,
    ) -> Result<MergeOutcome> {
        let options = special_operations::MergeOptions {
            file_name_save,
            file_folder_save,
            date_column: self.special.date_column.clone(),
        };
        special_operations::merge_timeseries_csv_files(old_path, new_path, &options, today)
    }
}
