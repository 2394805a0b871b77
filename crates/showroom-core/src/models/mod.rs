//! Domain models for the photo upload pipeline

pub mod car;
pub mod media;
pub mod upload;

pub use car::{CarRecord, CreateCarRequest};
pub use media::{
    CompressedFile, CompressionTarget, MediaFile, OutputFormat, SizeLimits, SourceFile,
};
pub use upload::{
    PresignFileSpec, PresignedDestination, ProgressCounters, TaskState, UploadDestination,
    UploadTask, UploadedPhoto, VerificationResult,
};
