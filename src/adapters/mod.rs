// Adapters layer: concrete ObjectStore implementations for external systems.

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

pub use local::LocalObjectStore;
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;
