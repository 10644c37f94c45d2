use crate::utils::error::{ControllerError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_DATASET_BUCKET: &str = "dataset-system";
pub const DEFAULT_DATE_COLUMN: &str = "일자";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub special: SpecialConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    S3,
    Local,
}

impl FromStr for Backend {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(Backend::S3),
            "local" => Ok(Backend::Local),
            other => Err(ControllerError::InvalidConfigValueError {
                field: "connection.backend".to_string(),
                value: other.to_string(),
                reason: "Supported backends: s3, local".to_string(),
            }),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::S3 => write!(f, "s3"),
            Backend::Local => write!(f, "local"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub backend: Backend,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    pub profile: Option<String>,
    /// Root directory holding one sub-directory per bucket (local backend only).
    pub local_root: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialConfig {
    #[serde(default = "default_dataset_bucket")]
    pub dataset_bucket: String,
    #[serde(default = "default_date_column")]
    pub date_column: String,
}

fn default_dataset_bucket() -> String {
    DEFAULT_DATASET_BUCKET.to_string()
}

fn default_date_column() -> String {
    DEFAULT_DATE_COLUMN.to_string()
}

impl Default for SpecialConfig {
    fn default() -> Self {
        Self {
            dataset_bucket: default_dataset_bucket(),
            date_column: default_date_column(),
        }
    }
}

impl ControllerConfig {
    /// Load a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ControllerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ControllerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Environment variables win over the file.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("S3_BACKEND") {
            self.connection.backend = backend.parse()?;
        }
        if let Some(region) = lookup("S3_REGION") {
            self.connection.region = Some(region);
        }
        if let Some(endpoint) = lookup("S3_ENDPOINT_URL") {
            self.connection.endpoint_url = Some(endpoint);
        }
        if let Some(path_style) = lookup("S3_FORCE_PATH_STYLE") {
            self.connection.force_path_style =
                path_style.parse().map_err(|_| ControllerError::InvalidConfigValueError {
                    field: "S3_FORCE_PATH_STYLE".to_string(),
                    value: path_style.clone(),
                    reason: "Expected true or false".to_string(),
                })?;
        }
        if let Some(root) = lookup("S3_LOCAL_ROOT") {
            self.connection.local_root = Some(root);
        }
        if let Some(bucket) = lookup("S3_DATASET_BUCKET") {
            self.special.dataset_bucket = bucket;
        }
        Ok(())
    }

    pub fn local_root(&self) -> Result<&str> {
        validation::validate_required_field("connection.local_root", &self.connection.local_root)
            .map(String::as_str)
    }
}

impl Validate for ControllerConfig {
    fn validate(&self) -> Result<()> {
        if let Some(region) = &self.connection.region {
            validation::validate_aws_region("connection.region", region)?;
        }

        if let Some(endpoint) = &self.connection.endpoint_url {
            validation::validate_url("connection.endpoint_url", endpoint)?;
        }

        if self.connection.backend == Backend::Local {
            validation::validate_path("connection.local_root", self.local_root()?)?;
        }

        validation::validate_s3_bucket_name("special.dataset_bucket", &self.special.dataset_bucket)?;
        validation::validate_non_empty_string("special.date_column", &self.special.date_column)?;

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
