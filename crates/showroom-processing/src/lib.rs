//! Showroom Processing Library
//!
//! Pure, network-free stages of the upload pipeline: photo compression and the
//! size/count guard that runs before and after it.

pub mod compression;
pub mod guard;

pub use compression::{
    compress_batch, CompressionProgress, CompressionReport, ImageCompressor, PassthroughFile,
};
pub use guard::{BatchValidator, GuardStage};
