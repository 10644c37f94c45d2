pub mod controller;
pub mod dataframe_reader;
pub mod scanner;
pub mod special_operations;
pub mod structure;
pub mod transfer;

pub use crate::domain::model::{DataFrame, KeyOption, LocalOption, ObjectSummary, RelocateMode};
pub use crate::domain::ports::ObjectStore;
pub use crate::utils::error::Result;
