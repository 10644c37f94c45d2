use crate::core::scanner::{normalize_prefix, scan_files_in_bucket_by_regex};
use crate::domain::model::{DataFrame, KeyOption};
use crate::domain::ports::ObjectStore;
use crate::utils::error::{ControllerError, Result};
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use chrono::Timelike;
use std::io::Cursor;

/// Parse CSV bytes with a header row. Short rows are padded and long rows
/// truncated to the header width.
pub fn parse_csv(bytes: &[u8]) -> Result<DataFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(DataFrame::new(columns, rows))
}

/// First worksheet of an `.xls`/`.xlsx` workbook, first row as header.
pub fn parse_excel(bytes: Vec<u8>) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ControllerError::ProcessingError {
            message: "Workbook has no worksheets".to_string(),
        })??;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_text).collect(),
        None => return Ok(DataFrame::default()),
    };
    let rows = rows.map(|row| row.iter().map(cell_text).collect()).collect();

    Ok(DataFrame::new(columns, rows))
}

/// Date-formatted cells become `YYYY-MM-DD` (plus the time when it is not midnight).
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 => {
                dt.format("%Y-%m-%d").to_string()
            }
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        _ => cell.to_string(),
    }
}

fn object_key(bucket_prefix: Option<&str>, file_name: &str) -> String {
    format!("{}{}", normalize_prefix(bucket_prefix.unwrap_or("")), file_name)
}

/// Python-style index into `len` items: negative values count from the end.
pub fn resolve_index(index: isize, len: usize) -> Result<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        Some(index as usize).filter(|i| *i < len)
    };
    resolved.ok_or(ControllerError::IndexOutOfRange { index, len })
}

/// Read a CSV object, addressed either by `file_name` under `bucket_prefix`
/// or directly by `file_key`. The name wins when both are given.
pub async fn open_df_in_bucket<S>(
    store: &S,
    bucket: &str,
    bucket_prefix: Option<&str>,
    file_name: Option<&str>,
    file_key: Option<&str>,
) -> Result<DataFrame>
where
    S: ObjectStore + ?Sized,
{
    let key = match (file_name, file_key) {
        (Some(name), _) => object_key(bucket_prefix, name),
        (None, Some(key)) => key.to_string(),
        (None, None) => {
            return Err(ControllerError::InvalidArgument {
                message: "Either 'file_name' or 'file_key' must be provided.".to_string(),
            })
        }
    };

    let content = store.get_object(bucket, &key).await?;
    let df = parse_csv(&content)?;

    tracing::info!("Successfully read file: {}", key);
    tracing::info!("DataFrame shape: {:?}", df.shape());
    Ok(df)
}

/// Read the `index`-th CSV object matching `regex` (default: the last one).
pub async fn open_df_in_bucket_by_regex<S>(
    store: &S,
    bucket: &str,
    bucket_prefix: &str,
    regex: &str,
    index: isize,
) -> Result<DataFrame>
where
    S: ObjectStore + ?Sized,
{
    let keys =
        scan_files_in_bucket_by_regex(store, bucket, bucket_prefix, regex, KeyOption::Key).await?;
    let key = &keys[resolve_index(index, keys.len())?];
    open_df_in_bucket(store, bucket, None, None, Some(key)).await
}

pub async fn open_excel_in_bucket<S>(
    store: &S,
    bucket: &str,
    bucket_prefix: &str,
    file_name: &str,
) -> Result<DataFrame>
where
    S: ObjectStore + ?Sized,
{
    let key = object_key(Some(bucket_prefix), file_name);
    let content = store.get_object(bucket, &key).await?;
    let df = parse_excel(content)?;
    tracing::info!("Successfully read workbook: {} {:?}", key, df.shape());
    Ok(df)
}

/// Read the last workbook (in key order) whose name matches `regex`.
pub async fn open_excel_in_bucket_by_regex<S>(
    store: &S,
    bucket: &str,
    bucket_prefix: &str,
    regex: &str,
) -> Result<DataFrame>
where
    S: ObjectStore + ?Sized,
{
    let names =
        scan_files_in_bucket_by_regex(store, bucket, bucket_prefix, regex, KeyOption::Name).await?;
    let name = names
        .last()
        .ok_or(ControllerError::IndexOutOfRange { index: -1, len: 0 })?;
    open_excel_in_bucket(store, bucket, bucket_prefix, name).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_pads_and_truncates() {
        let df = parse_csv(b"a,b,c\n1,2,3\n4,5\n6,7,8,9\n").unwrap();
        assert_eq!(df.columns, vec!["a", "b", "c"]);
        assert_eq!(df.shape(), (3, 3));
        assert_eq!(df.rows[1], vec!["4", "5", ""]);
        assert_eq!(df.rows[2], vec!["6", "7", "8"]);
    }

    #[test]
    fn test_parse_csv_header_only() {
        let df = parse_csv("일자,종가\n".as_bytes()).unwrap();
        assert!(df.is_empty());
        assert_eq!(df.column_index("종가"), Some(1));
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(-1, 3).unwrap(), 2);
        assert_eq!(resolve_index(-3, 3).unwrap(), 0);
        assert_eq!(resolve_index(0, 3).unwrap(), 0);
        assert!(resolve_index(3, 3).is_err());
        assert!(resolve_index(-4, 3).is_err());
        assert!(resolve_index(-1, 0).is_err());
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key(Some("daily"), "a.csv"), "daily/a.csv");
        assert_eq!(object_key(Some("daily/"), "a.csv"), "daily/a.csv");
        assert_eq!(object_key(None, "a.csv"), "a.csv");
    }

    #[test]
    fn test_cell_text_formats_dates() {
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-01-02T09:30:00".to_string())),
            "2024-01-02 09:30:00"
        );
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-01-02T00:00:00".to_string())),
            "2024-01-02"
        );
        assert_eq!(cell_text(&Data::Float(100.0)), "100");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_parse_excel_rejects_garbage() {
        assert!(parse_excel(b"not a workbook".to_vec()).is_err());
    }
}
