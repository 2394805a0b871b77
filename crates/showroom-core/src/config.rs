//! Configuration module
//!
//! Upload limits and tuning knobs. Every value has a compiled-in default and may be
//! overridden through `SHOWROOM_*` environment variables (a `.env` file is honoured).
//!
//! | Variable | Effect |
//! |---|---|
//! | `SHOWROOM_UPLOAD_MAX_COUNT` | Hard cap on number of photos per submission |
//! | `SHOWROOM_UPLOAD_MAX_SINGLE_MB` | Per-file size ceiling (checked pre- and post-compression) |
//! | `SHOWROOM_UPLOAD_MAX_TOTAL_MB` | Aggregate size ceiling across the whole batch (0 disables) |
//! | `SHOWROOM_UPLOAD_CONCURRENCY` | Max simultaneous in-flight uploads |
//! | `SHOWROOM_UPLOAD_RETRIES` | Max retry attempts per file after the first failure |
//! | `SHOWROOM_UPLOAD_TIMEOUT_MS` | Per-attempt network timeout |
//! | `SHOWROOM_UPLOAD_RETRY_BASE_MS` | Base of the exponential retry backoff |
//! | `SHOWROOM_UPLOAD_RETRY_JITTER_MS` | Upper bound of the random jitter added to each backoff |
//! | `SHOWROOM_UPLOAD_PRESIGN_ATTEMPTS` | Presign negotiation attempts before degrading to multipart |
//! | `SHOWROOM_VERIFY_ATTEMPTS` | Verification polls after the uploads settle |
//! | `SHOWROOM_VERIFY_BACKOFF_MS` | Linear backoff unit between verification polls |
//! | `SHOWROOM_COMPRESS_MAX_WIDTH` / `_MAX_HEIGHT` | Bounding box of compressed photos |
//! | `SHOWROOM_COMPRESS_QUALITY` | Encoder quality, 0.0 to 1.0 |
//! | `SHOWROOM_COMPRESS_CONCURRENCY` | Photos compressed at once |
//! | `SHOWROOM_COMPRESS_FORMAT` | `webp` or `jpeg` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::models::{CompressionTarget, OutputFormat, SizeLimits};

// Defaults
const MAX_COUNT: usize = 20;
const MAX_SINGLE_MB: f64 = 10.0;
const MAX_TOTAL_MB: f64 = 0.0;
const CONCURRENCY: usize = 2;
const RETRIES: u32 = 3;
const TIMEOUT_MS: u64 = 60_000;
const RETRY_BASE_MS: u64 = 500;
const RETRY_JITTER_MS: u64 = 250;
const PRESIGN_ATTEMPTS: u32 = 1;
const VERIFY_ATTEMPTS: u32 = 3;
const VERIFY_BACKOFF_MS: u64 = 500;

/// Upload pipeline configuration
#[derive(Clone, Debug, PartialEq)]
pub struct UploadConfig {
    pub max_count: usize,
    pub max_single_mb: f64,
    pub max_total_mb: f64,
    pub concurrency: usize,
    pub retries: u32,
    pub timeout_ms: u64,
    pub retry_base_ms: u64,
    pub retry_jitter_ms: u64,
    pub presign_attempts: u32,
    pub verify_attempts: u32,
    pub verify_backoff_ms: u64,
    pub compression: CompressionTarget,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_count: MAX_COUNT,
            max_single_mb: MAX_SINGLE_MB,
            max_total_mb: MAX_TOTAL_MB,
            concurrency: CONCURRENCY,
            retries: RETRIES,
            timeout_ms: TIMEOUT_MS,
            retry_base_ms: RETRY_BASE_MS,
            retry_jitter_ms: RETRY_JITTER_MS,
            presign_attempts: PRESIGN_ATTEMPTS,
            verify_attempts: VERIFY_ATTEMPTS,
            verify_backoff_ms: VERIFY_BACKOFF_MS,
            compression: CompressionTarget::default(),
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an arbitrary key lookup. Unparseable values fall
    /// back to the default rather than failing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

        let compression = CompressionTarget {
            max_width: parse_or(get("SHOWROOM_COMPRESS_MAX_WIDTH"), defaults.compression.max_width),
            max_height: parse_or(
                get("SHOWROOM_COMPRESS_MAX_HEIGHT"),
                defaults.compression.max_height,
            ),
            quality: parse_or(get("SHOWROOM_COMPRESS_QUALITY"), defaults.compression.quality),
            concurrency: parse_or(
                get("SHOWROOM_COMPRESS_CONCURRENCY"),
                defaults.compression.concurrency,
            ),
            format: get("SHOWROOM_COMPRESS_FORMAT")
                .and_then(|v| OutputFormat::parse(&v))
                .unwrap_or(defaults.compression.format),
        };

        Self {
            max_count: parse_or(get("SHOWROOM_UPLOAD_MAX_COUNT"), defaults.max_count),
            max_single_mb: parse_or(get("SHOWROOM_UPLOAD_MAX_SINGLE_MB"), defaults.max_single_mb),
            max_total_mb: parse_or(get("SHOWROOM_UPLOAD_MAX_TOTAL_MB"), defaults.max_total_mb),
            concurrency: parse_or(get("SHOWROOM_UPLOAD_CONCURRENCY"), defaults.concurrency),
            retries: parse_or(get("SHOWROOM_UPLOAD_RETRIES"), defaults.retries),
            timeout_ms: parse_or(get("SHOWROOM_UPLOAD_TIMEOUT_MS"), defaults.timeout_ms),
            retry_base_ms: parse_or(get("SHOWROOM_UPLOAD_RETRY_BASE_MS"), defaults.retry_base_ms),
            retry_jitter_ms: parse_or(
                get("SHOWROOM_UPLOAD_RETRY_JITTER_MS"),
                defaults.retry_jitter_ms,
            ),
            presign_attempts: parse_or(
                get("SHOWROOM_UPLOAD_PRESIGN_ATTEMPTS"),
                defaults.presign_attempts,
            ),
            verify_attempts: parse_or(get("SHOWROOM_VERIFY_ATTEMPTS"), defaults.verify_attempts),
            verify_backoff_ms: parse_or(
                get("SHOWROOM_VERIFY_BACKOFF_MS"),
                defaults.verify_backoff_ms,
            ),
            compression,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_count == 0 {
            return Err(anyhow::anyhow!(
                "SHOWROOM_UPLOAD_MAX_COUNT must be greater than 0"
            ));
        }

        if self.max_single_mb <= 0.0 {
            return Err(anyhow::anyhow!(
                "SHOWROOM_UPLOAD_MAX_SINGLE_MB must be greater than 0"
            ));
        }

        if self.max_total_mb < 0.0 {
            return Err(anyhow::anyhow!(
                "SHOWROOM_UPLOAD_MAX_TOTAL_MB must not be negative"
            ));
        }

        if self.concurrency == 0 || self.compression.concurrency == 0 {
            return Err(anyhow::anyhow!("Upload and compression concurrency must be at least 1"));
        }

        if self.timeout_ms == 0 {
            return Err(anyhow::anyhow!(
                "SHOWROOM_UPLOAD_TIMEOUT_MS must be greater than 0"
            ));
        }

        if self.presign_attempts == 0 || self.verify_attempts == 0 {
            return Err(anyhow::anyhow!(
                "Presign and verification attempts must be at least 1"
            ));
        }

        if !(0.0..=1.0).contains(&self.compression.quality) {
            return Err(anyhow::anyhow!(
                "SHOWROOM_COMPRESS_QUALITY must be between 0.0 and 1.0"
            ));
        }

        if self.compression.max_width == 0 || self.compression.max_height == 0 {
            return Err(anyhow::anyhow!(
                "Compression bounds must be greater than 0"
            ));
        }

        Ok(())
    }

    pub fn size_limits(&self) -> SizeLimits {
        SizeLimits {
            max_count: self.max_count,
            max_single_mb: self.max_single_mb,
            max_total_mb: self.max_total_mb,
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_base(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }

    pub fn retry_jitter(&self) -> Duration {
        Duration::from_millis(self.retry_jitter_ms)
    }

    pub fn verify_backoff(&self) -> Duration {
        Duration::from_millis(self.verify_backoff_ms)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
