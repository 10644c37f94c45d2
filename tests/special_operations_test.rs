use anyhow::Result;
use chrono::NaiveDate;
use s3_controller::config::toml_config::SpecialConfig;
use s3_controller::core::special_operations::{
    merge_timeseries_csv_files, MenuDatasetRequest, MergeOptions,
};
use s3_controller::{ControllerError, LocalObjectStore, ObjectStore, S3Controller};
use std::path::Path;
use tempfile::TempDir;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}

#[tokio::test]
async fn test_locate_menu_datasets_uses_default_dates() -> Result<()> {
    let root = TempDir::new()?;
    std::fs::create_dir_all(root.path().join("dataset-system"))?;
    let store = LocalObjectStore::new(root.path());

    let prefix = "dataset-timeseries-menu2160-from20200101-to20240304-save20240305";
    store
        .put_object(
            "dataset-system",
            &format!("{}/menu2160-code100060-to20240304.csv", prefix),
            "일자,종가\n2024-03-04,100\n".as_bytes().to_vec(),
        )
        .await?;
    store
        .put_object(
            "dataset-system",
            &format!("{}/readme.txt", prefix),
            b"skip".to_vec(),
        )
        .await?;

    let controller = S3Controller::new(Box::new(store));
    let local = TempDir::new()?;
    let request = MenuDatasetRequest {
        menu_code: "2160".to_string(),
        ..MenuDatasetRequest::default()
    };

    let saved = controller
        .locate_menu_datasets(&request, day(2024, 3, 5), local.path())
        .await?;

    // The regex is searched in the full key, and the prefix itself names the menu.
    assert_eq!(saved.len(), 2);
    let folder = local.path().join("dataset-menu2160");
    assert!(saved.contains(&folder.join("menu2160-code100060-to20240304.csv")));
    assert!(folder.join("readme.txt").is_file());
    Ok(())
}

#[tokio::test]
async fn test_locate_menu_datasets_honors_dataset_bucket_and_snapshot_prefix() -> Result<()> {
    let root = TempDir::new()?;
    std::fs::create_dir_all(root.path().join("dataset-archive"))?;
    let store = LocalObjectStore::new(root.path());
    store
        .put_object(
            "dataset-archive",
            "dataset-snapshot-menu2205-at20240131-save20240201/menu2205-all.csv",
            b"a\n1\n".to_vec(),
        )
        .await?;

    let special = SpecialConfig {
        dataset_bucket: "dataset-archive".to_string(),
        ..SpecialConfig::default()
    };
    let controller = S3Controller::with_special_config(Box::new(store), special);
    let local = TempDir::new()?;
    let request = MenuDatasetRequest {
        menu_code: "2205".to_string(),
        start_date: None,
        end_date: Some("2024-01-31".to_string()),
        save_date: Some("2024-02-01".to_string()),
    };

    let saved = controller
        .locate_menu_datasets(&request, day(2024, 6, 1), local.path())
        .await?;
    assert_eq!(saved.len(), 1);

    let unknown = MenuDatasetRequest {
        menu_code: "1234".to_string(),
        ..MenuDatasetRequest::default()
    };
    let err = controller
        .locate_menu_datasets(&unknown, day(2024, 6, 1), local.path())
        .await
        .unwrap_err();
    assert!(matches!(err, ControllerError::InvalidArgument { .. }));
    Ok(())
}

#[test]
fn test_merge_appends_only_newer_rows() -> Result<()> {
    let dir = TempDir::new()?;
    let old = dir.path().join("menu2160-code100060-to20240103-save20240104.csv");
    let new = dir.path().join("menu2160-code100060-to20240106-save20240107.csv");
    write(
        &old,
        "일자,종가,거래량\n2024-01-02,100,10\n2024-01-03,101,11\n",
    )?;
    write(
        &new,
        "일자,거래량,종가\n20240103,99,999\n20240104,12,102\n20240105,13,103\n",
    )?;

    let out_dir = dir.path().join("merged");
    let options = MergeOptions {
        file_folder_save: Some(out_dir.clone()),
        ..MergeOptions::default()
    };
    let outcome = merge_timeseries_csv_files(&old, &new, &options, day(2024, 1, 8))?;

    assert_eq!(outcome.appended_rows, 2);
    assert_eq!(outcome.frame.shape(), (4, 3));
    assert_eq!(
        outcome.saved_to,
        out_dir.join("menu2160-code100060-to20240105-save20240108.csv")
    );

    let written = std::fs::read_to_string(&outcome.saved_to)?;
    assert_eq!(
        written,
        "일자,종가,거래량\n\
         2024-01-02,100,10\n\
         2024-01-03,101,11\n\
         2024-01-04,102,12\n\
         2024-01-05,103,13\n"
    );
    Ok(())
}

#[test]
fn test_merge_keeps_columns_only_the_new_file_has() -> Result<()> {
    let dir = TempDir::new()?;
    let old = dir.path().join("menu2160-code7-to20240102.csv");
    let new = dir.path().join("menu2160-code7-to20240103.csv");
    write(&old, "일자,종가\n2024-01-01,1\n2024-01-02,2\n")?;
    write(&new, "일자,종가,거래량\n2024-01-02,2,200\n2024-01-03,3,300\n")?;

    let options = MergeOptions {
        file_folder_save: Some(dir.path().join("out")),
        ..MergeOptions::default()
    };
    let outcome = merge_timeseries_csv_files(&old, &new, &options, day(2024, 1, 4))?;

    assert_eq!(outcome.appended_rows, 1);
    assert_eq!(outcome.frame.columns, vec!["일자", "종가", "거래량"]);
    assert_eq!(outcome.frame.column("거래량").unwrap(), vec!["", "", "300"]);

    let written = std::fs::read_to_string(&outcome.saved_to)?;
    assert_eq!(
        written,
        "일자,종가,거래량\n\
         2024-01-01,1,\n\
         2024-01-02,2,\n\
         2024-01-03,3,300\n"
    );
    Ok(())
}

#[test]
fn test_merge_with_nothing_new_keeps_old_rows() -> Result<()> {
    let dir = TempDir::new()?;
    let old = dir.path().join("menu2160-code1-to20240103.csv");
    let new = dir.path().join("menu2160-code1-new.csv");
    write(&old, "일자,종가\n2024/01/02,1\n2024/01/03,2\n")?;
    write(&new, "일자,종가\n2024-01-01,0\n")?;

    let options = MergeOptions {
        file_name_save: Some("merged.csv".to_string()),
        file_folder_save: Some(dir.path().join("out")),
        ..MergeOptions::default()
    };
    let outcome = merge_timeseries_csv_files(&old, &new, &options, day(2024, 1, 4))?;

    assert_eq!(outcome.appended_rows, 0);
    assert_eq!(outcome.frame.column("일자").unwrap(), vec!["2024-01-02", "2024-01-03"]);
    assert!(dir.path().join("out/merged.csv").is_file());
    Ok(())
}

#[test]
fn test_merge_rejects_empty_and_malformed_files() -> Result<()> {
    let dir = TempDir::new()?;
    let old = dir.path().join("old.csv");
    let empty = dir.path().join("empty.csv");
    let no_date = dir.path().join("no-date.csv");
    write(&old, "일자,종가\n2024-01-02,1\n")?;
    write(&empty, "일자,종가\n")?;
    write(&no_date, "date,close\n2024-01-05,1\n")?;

    let options = MergeOptions {
        file_folder_save: Some(dir.path().join("out")),
        ..MergeOptions::default()
    };

    let err = merge_timeseries_csv_files(&old, &empty, &options, day(2024, 1, 8)).unwrap_err();
    assert!(matches!(err, ControllerError::EmptyFile { .. }));

    let err = merge_timeseries_csv_files(&old, &no_date, &options, day(2024, 1, 8)).unwrap_err();
    assert!(matches!(err, ControllerError::ProcessingError { .. }));

    let missing = dir.path().join("missing.csv");
    let err = merge_timeseries_csv_files(&missing, &old, &options, day(2024, 1, 8)).unwrap_err();
    assert!(matches!(err, ControllerError::IoError(_)));
    Ok(())
}
