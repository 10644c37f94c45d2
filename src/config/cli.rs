use crate::config::toml_config::{Backend, ControllerConfig};
use crate::domain::model::{KeyOption, LocalOption};
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "s3-controller")]
#[command(about = "Scan, transfer and read files in S3 buckets by regex")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Storage backend (s3 or local)
    #[arg(long, global = true)]
    pub backend: Option<Backend>,

    /// Root directory for the local backend (one sub-directory per bucket)
    #[arg(long, global = true)]
    pub local_root: Option<String>,

    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Custom S3 endpoint, e.g. a MinIO server
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct BucketScan {
    #[arg(long)]
    pub bucket: String,

    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Regex matched anywhere in the object key
    #[arg(long)]
    pub regex: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List keys in a bucket matching a regex
    Scan {
        #[command(flatten)]
        target: BucketScan,

        /// Return full keys or bare file names
        #[arg(long, default_value = "key")]
        option: KeyOption,
    },
    /// List local files matching a regex
    ScanLocal {
        #[arg(long)]
        folder: PathBuf,

        #[arg(long)]
        regex: String,

        #[arg(long, default_value = "name")]
        option: LocalOption,
    },
    /// Download matching objects into a local folder
    Download {
        #[command(flatten)]
        target: BucketScan,

        #[arg(long)]
        local_folder: PathBuf,

        #[arg(long)]
        local_subfolder: Option<String>,
    },
    /// Upload matching local files into a bucket
    Upload {
        #[arg(long)]
        local_folder: PathBuf,

        #[arg(long)]
        local_subfolder: Option<String>,

        #[arg(long)]
        regex: String,

        #[arg(long)]
        bucket: String,

        #[arg(long)]
        prefix: Option<String>,
    },
    /// Copy matching objects to another bucket
    Copy(RelocateArgs),
    /// Move matching objects to another bucket
    Move(RelocateArgs),
    /// Read a CSV object and print it
    ReadCsv {
        #[arg(long)]
        bucket: String,

        #[arg(long)]
        prefix: Option<String>,

        #[arg(long, conflicts_with = "key")]
        file_name: Option<String>,

        #[arg(long)]
        key: Option<String>,

        /// Pick the file by regex instead of name/key
        #[arg(long, conflicts_with_all = ["file_name", "key"])]
        regex: Option<String>,

        /// Position among regex matches; negative counts from the end
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        index: isize,

        #[command(flatten)]
        output: FrameOutput,
    },
    /// Read the first worksheet of an Excel object and print it
    ReadExcel {
        #[arg(long)]
        bucket: String,

        #[arg(long, default_value = "")]
        prefix: String,

        #[arg(long, required_unless_present = "regex")]
        file_name: Option<String>,

        /// Pick the last workbook whose name matches
        #[arg(long, conflicts_with = "file_name")]
        regex: Option<String>,

        #[command(flatten)]
        output: FrameOutput,
    },
    /// Create an empty "subfolder/" marker object
    Mkdir {
        #[arg(long)]
        bucket: String,

        #[arg(long)]
        subfolder: String,
    },
    /// Download the dated datasets of a menu export
    LocateMenu {
        #[arg(long)]
        menu_code: String,

        #[arg(long)]
        start_date: Option<String>,

        #[arg(long)]
        end_date: Option<String>,

        #[arg(long)]
        save_date: Option<String>,

        #[arg(long, default_value = ".")]
        local_folder: PathBuf,
    },
    /// Append newer rows of one timeseries CSV to another
    MergeTimeseries {
        #[arg(long)]
        old: PathBuf,

        #[arg(long)]
        new: PathBuf,

        #[arg(long)]
        file_name_save: Option<String>,

        #[arg(long)]
        file_folder_save: Option<PathBuf>,
    },
    /// Print the effective configuration
    ShowConfig,
}

#[derive(Debug, Clone, Args)]
pub struct RelocateArgs {
    #[arg(long)]
    pub source_bucket: String,

    #[arg(long)]
    pub target_bucket: String,

    #[arg(long)]
    pub regex: String,

    #[arg(long, default_value = "")]
    pub source_prefix: String,

    #[arg(long, default_value = "")]
    pub target_prefix: String,
}

#[derive(Debug, Clone, Args)]
pub struct FrameOutput {
    /// Rows to print (0 prints all)
    #[arg(long, default_value = "10")]
    pub head: usize,

    /// Print rows as JSON records instead of CSV
    #[arg(long)]
    pub json: bool,
}

impl CliConfig {
    /// File, then environment, then command-line flags.
    pub fn load_config(&self) -> Result<ControllerConfig> {
        let mut config = match &self.config {
            Some(path) => ControllerConfig::from_file(path)?,
            None => ControllerConfig::default(),
        };
        config.apply_env_overrides()?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ControllerConfig) {
        if let Some(backend) = self.backend {
            config.connection.backend = backend;
        }
        if let Some(root) = &self.local_root {
            config.connection.local_root = Some(root.clone());
        }
        if let Some(region) = &self.region {
            config.connection.region = Some(region.clone());
        }
        if let Some(endpoint) = &self.endpoint_url {
            config.connection.endpoint_url = Some(endpoint.clone());
        }
    }
}
