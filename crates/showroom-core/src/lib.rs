//! Showroom Core Library
//!
//! This crate provides the domain models, error types and configuration that are
//! shared by every stage of the vehicle photo upload pipeline.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::UploadConfig;
pub use error::{AppError, ErrorMetadata, LogLevel, ValidationError};
