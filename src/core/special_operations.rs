//! Dataset maintenance routines built on the generic scan/transfer operations:
//! locating dated menu datasets and merging timeseries CSV snapshots.

use crate::core::dataframe_reader::parse_csv;
use crate::core::transfer::download_files_from_s3;
use crate::domain::model::{DataFrame, MergeOutcome};
use crate::domain::ports::ObjectStore;
use crate::utils::error::{ControllerError, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const DEFAULT_START_DATE: &str = "2020-01-01";
const COMPACT_DATE: &str = "%Y%m%d";
const ISO_DATE: &str = "%Y-%m-%d";
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%Y.%m.%d"];

#[derive(Debug, Clone, Default)]
pub struct MenuDatasetRequest {
    pub menu_code: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub save_date: Option<String>,
}

fn compact(date: &str) -> String {
    date.replace('-', "")
}

/// Object prefix that holds the datasets of one menu export.
pub fn menu_dataset_prefix(menu_code: &str, start_date: &str, end_date: &str, save_date: &str) -> Result<String> {
    match menu_code {
        "2160" => Ok(format!(
            "dataset-timeseries-menu2160-from{}-to{}-save{}",
            compact(start_date),
            compact(end_date),
            compact(save_date)
        )),
        "2205" => Ok(format!(
            "dataset-snapshot-menu2205-at{}-save{}",
            compact(end_date),
            compact(save_date)
        )),
        other => Err(ControllerError::InvalidArgument {
            message: format!("Unsupported menu code '{}'. Available menu codes: 2160, 2205", other),
        }),
    }
}

/// Download the datasets of `request.menu_code` into `local_root/dataset-menu{code}`.
///
/// Missing dates default to 2020-01-01 (start), the day before `today` (end)
/// and `today` (save).
pub async fn locate_menu_datasets<S>(
    store: &S,
    dataset_bucket: &str,
    request: &MenuDatasetRequest,
    today: NaiveDate,
    local_root: impl AsRef<Path>,
) -> Result<Vec<PathBuf>>
where
    S: ObjectStore + ?Sized,
{
    let start_date = request
        .start_date
        .clone()
        .unwrap_or_else(|| DEFAULT_START_DATE.to_string());
    let end_date = request
        .end_date
        .clone()
        .unwrap_or_else(|| {
            let yesterday = today.pred_opt().unwrap_or(today);
            yesterday.format(COMPACT_DATE).to_string()
        });
    let save_date = request
        .save_date
        .clone()
        .unwrap_or_else(|| today.format(COMPACT_DATE).to_string());

    let prefix = menu_dataset_prefix(&request.menu_code, &start_date, &end_date, &save_date)?;
    let regex = format!("menu{}", request.menu_code);
    let local_folder = local_root
        .as_ref()
        .join(format!("dataset-menu{}", request.menu_code));

    tracing::info!(
        "Locating menu {} datasets from s3://{}/{}",
        request.menu_code,
        dataset_bucket,
        prefix
    );
    download_files_from_s3(store, dataset_bucket, &regex, &local_folder, &prefix, None).await
}

/// Parse a date cell, ignoring any time part.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let date_part = value
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .ok_or_else(|| ControllerError::ProcessingError {
            message: format!("Unrecognized date '{}'", value),
        })
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub file_name_save: Option<String>,
    pub file_folder_save: Option<PathBuf>,
    pub date_column: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            file_name_save: None,
            file_folder_save: None,
            date_column: crate::config::toml_config::DEFAULT_DATE_COLUMN.to_string(),
        }
    }
}

/// Default (file name, folder name) for a merge of `old_file_name`.
///
/// `menu2160-code100060-to20240131-save20240201.csv` has base
/// `menu2160-code100060` and menu `menu2160`.
pub fn merge_file_names(
    old_file_name: &str,
    first_date: NaiveDate,
    last_date: NaiveDate,
    today: NaiveDate,
) -> (String, String) {
    let base = old_file_name.split("-to").next().unwrap_or(old_file_name);
    let menu = base.split('-').next().unwrap_or(base);
    let first = first_date.format(COMPACT_DATE);
    let last = last_date.format(COMPACT_DATE);
    let today = today.format(COMPACT_DATE);

    (
        format!("{}-to{}-save{}.csv", base, last, today),
        format!(
            "dataset-timeseries-{}-from{}-to{}-merge{}",
            menu, first, last, today
        ),
    )
}

fn read_frame(path: &Path) -> Result<DataFrame> {
    let bytes = std::fs::read(path)?;
    let frame = parse_csv(&bytes)?;
    if frame.is_empty() {
        return Err(ControllerError::EmptyFile {
            path: path.display().to_string(),
        });
    }
    Ok(frame)
}

fn date_index(frame: &DataFrame, column: &str, path: &Path) -> Result<usize> {
    frame
        .column_index(column)
        .ok_or_else(|| ControllerError::ProcessingError {
            message: format!("Column '{}' not found in {}", column, path.display()),
        })
}

/// Append rows of `new_path` dated after the last row of `old_path`, and save
/// the result as a new CSV.
///
/// The output header is the old header followed by any columns only the new
/// file has.
pub fn merge_timeseries_csv_files(
    old_path: impl AsRef<Path>,
    new_path: impl AsRef<Path>,
    options: &MergeOptions,
    today: NaiveDate,
) -> Result<MergeOutcome> {
    let old_path = old_path.as_ref();
    let new_path = new_path.as_ref();
    let mut old = read_frame(old_path)?;
    let new = read_frame(new_path)?;

    let old_idx = date_index(&old, &options.date_column, old_path)?;
    let new_idx = date_index(&new, &options.date_column, new_path)?;

    let mut old_last = None;
    for row in old.rows.iter_mut() {
        let date = parse_date(&row[old_idx])?;
        row[old_idx] = date.format(ISO_DATE).to_string();
        old_last = Some(date);
    }
    let old_last = old_last.ok_or_else(|| ControllerError::EmptyFile {
        path: old_path.display().to_string(),
    })?;

    // Columns only the new file has are appended; older rows leave them empty.
    let added: Vec<String> = new
        .columns
        .iter()
        .filter(|column| old.column_index(column).is_none())
        .cloned()
        .collect();
    if !added.is_empty() {
        tracing::info!("Adding columns from {}: {:?}", new_path.display(), added);
        old.columns.extend(added);
        let width = old.columns.len();
        for row in old.rows.iter_mut() {
            row.resize(width, String::new());
        }
    }

    let column_map: Vec<Option<usize>> = old
        .columns
        .iter()
        .map(|column| new.column_index(column))
        .collect();

    let mut appended = Vec::new();
    for row in &new.rows {
        let date = parse_date(&row[new_idx])?;
        if date <= old_last {
            continue;
        }
        let aligned: Vec<String> = column_map
            .iter()
            .enumerate()
            .map(|(i, source)| {
                if i == old_idx {
                    date.format(ISO_DATE).to_string()
                } else {
                    source
                        .and_then(|j| row.get(j).cloned())
                        .unwrap_or_default()
                }
            })
            .collect();
        appended.push((date, aligned));
    }

    let first_date = parse_date(&old.rows[0][old_idx])?;
    let last_date = appended.last().map(|(d, _)| *d).unwrap_or(old_last);
    let appended_rows = appended.len();
    old.rows.extend(appended.into_iter().map(|(_, row)| row));

    let old_file_name = old_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (default_name, default_folder) =
        merge_file_names(&old_file_name, first_date, last_date, today);
    let file_name = options.file_name_save.clone().unwrap_or(default_name);
    let folder = options
        .file_folder_save
        .clone()
        .unwrap_or_else(|| Path::new(".").join(default_folder));

    std::fs::create_dir_all(&folder)?;
    let saved_to = folder.join(file_name);
    std::fs::write(&saved_to, old.to_csv_bytes()?)?;
    tracing::info!(
        "Merged file saved as {} ({} rows appended)",
        saved_to.display(),
        appended_rows
    );

    Ok(MergeOutcome {
        frame: old,
        saved_to,
        appended_rows,
    })
}
