use crate::utils::error::{ControllerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

impl ObjectSummary {
    /// Last `/` segment of the key.
    pub fn name(&self) -> &str {
        file_name_of(&self.key)
    }
}

pub fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Shape of the values returned by a bucket scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum KeyOption {
    #[default]
    Key,
    Name,
}

impl FromStr for KeyOption {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "key" => Ok(KeyOption::Key),
            "name" => Ok(KeyOption::Name),
            other => Err(ControllerError::InvalidArgument {
                message: format!("Invalid option '{}'. Available options: key, name", other),
            }),
        }
    }
}

impl fmt::Display for KeyOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyOption::Key => write!(f, "key"),
            KeyOption::Name => write!(f, "name"),
        }
    }
}

/// Shape of the values returned by a local directory scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LocalOption {
    #[default]
    Name,
    Path,
}

impl FromStr for LocalOption {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(LocalOption::Name),
            "path" => Ok(LocalOption::Path),
            other => Err(ControllerError::InvalidArgument {
                message: format!("Invalid option '{}'. Available options: name, path", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelocateMode {
    Copy,
    Move,
}

impl fmt::Display for RelocateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocateMode::Copy => write!(f, "copy"),
            RelocateMode::Move => write!(f, "move"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RelocationReport {
    /// (source key, target key)
    pub relocated: Vec<(String, String)>,
    /// (source key, error message)
    pub failed: Vec<(String, String)>,
}

impl RelocationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A table of string cells with a header row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataFrame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// (rows, columns), header excluded.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    pub fn head(&self, n: usize) -> DataFrame {
        DataFrame {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        let width = self.columns.len();
        for row in &self.rows {
            let cells = (0..width).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
            writer.write_record(cells)?;
        }
        writer.into_inner().map_err(|e| ControllerError::ProcessingError {
            message: format!("Failed to flush CSV writer: {}", e),
        })
    }

    pub fn to_json_records(&self) -> serde_json::Value {
        let records = self
            .rows
            .iter()
            .map(|row| {
                let object = self
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let cell = row.get(i).cloned().unwrap_or_default();
                        (column.clone(), serde_json::Value::String(cell))
                    })
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(records)
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub frame: DataFrame,
    pub saved_to: PathBuf,
    pub appended_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(
            vec!["일자".to_string(), "value".to_string()],
            vec![
                vec!["2024-01-01".to_string(), "10".to_string()],
                vec!["2024-01-02".to_string()],
            ],
        )
    }

    #[test]
    fn test_key_option_parsing() {
        assert_eq!("key".parse::<KeyOption>().unwrap(), KeyOption::Key);
        assert_eq!("name".parse::<KeyOption>().unwrap(), KeyOption::Name);
        let err = "path".parse::<KeyOption>().unwrap_err();
        assert!(err.to_string().contains("Available options: key, name"));
    }

    #[test]
    fn test_object_name_is_last_segment() {
        let object = ObjectSummary {
            key: "daily/2024/report.csv".to_string(),
            size: 12,
        };
        assert_eq!(object.name(), "report.csv");
        assert_eq!(file_name_of("top.csv"), "top.csv");
    }

    #[test]
    fn test_dataframe_column_pads_short_rows() {
        let df = frame();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("value").unwrap(), vec!["10", ""]);
        assert!(df.column("missing").is_none());
    }

    #[test]
    fn test_dataframe_csv_output() {
        let df = frame().head(1);
        let csv = String::from_utf8(df.to_csv_bytes().unwrap()).unwrap();
        assert_eq!(csv, "일자,value\n2024-01-01,10\n");
    }

    #[test]
    fn test_dataframe_json_records() {
        let json = frame().to_json_records();
        assert_eq!(json[0]["value"], "10");
        assert_eq!(json[1]["value"], "");
    }
}
