pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{Backend, ControllerConfig};

pub use adapters::LocalObjectStore;
#[cfg(feature = "s3")]
pub use adapters::S3ObjectStore;

pub use core::controller::S3Controller;
pub use domain::model::{DataFrame, KeyOption, LocalOption, ObjectSummary, RelocateMode, RelocationReport};
pub use domain::ports::ObjectStore;
pub use utils::error::{ControllerError, Result};
