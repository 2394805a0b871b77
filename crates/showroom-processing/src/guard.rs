//! Size/count guard for photo batches.
//!
//! Runs twice per submission: on the raw selection, to reject cheaply before any
//! compression work, and on the compressed output, which is the authoritative gate
//! before the first network call. Re-encoding can grow already-optimized inputs, so
//! the second pass is never skipped.

use showroom_core::models::{MediaFile, SizeLimits};
use showroom_core::ValidationError;

/// Which pass of the guard is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStage {
    PreCompression,
    PostCompression,
}

impl GuardStage {
    pub fn as_str(self) -> &'static str {
        match self {
            GuardStage::PreCompression => "pre_compression",
            GuardStage::PostCompression => "post_compression",
        }
    }
}

/// Batch validator
///
/// Checks are fail-fast: the first violated limit is reported and nothing is
/// processed further.
#[derive(Debug, Clone)]
pub struct BatchValidator {
    limits: SizeLimits,
}

impl BatchValidator {
    pub fn new(limits: SizeLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SizeLimits {
        &self.limits
    }

    /// Validate a whole batch
    pub fn validate<F: MediaFile>(
        &self,
        files: &[F],
        stage: GuardStage,
    ) -> Result<(), ValidationError> {
        let result = self
            .validate_count(files.len())
            .and_then(|_| files.iter().try_for_each(|f| self.validate_file(f)))
            .and_then(|_| self.validate_total(files));

        if let Err(ref e) = result {
            tracing::debug!(
                stage = stage.as_str(),
                file_count = files.len(),
                offending_file = e.offending_file(),
                error = %e,
                "Photo batch rejected"
            );
        }

        result
    }

    /// Validate file count
    pub fn validate_count(&self, count: usize) -> Result<(), ValidationError> {
        if count > self.limits.max_count {
            return Err(ValidationError::TooManyFiles {
                count,
                max: self.limits.max_count,
            });
        }
        Ok(())
    }

    /// Validate a single file's size and content type
    pub fn validate_file<F: MediaFile>(&self, file: &F) -> Result<(), ValidationError> {
        if file.size_bytes() == 0 {
            return Err(ValidationError::EmptyFile {
                name: file.name().to_string(),
            });
        }

        if !file.content_type().to_lowercase().starts_with("image/") {
            return Err(ValidationError::UnsupportedContentType {
                name: file.name().to_string(),
                content_type: file.content_type().to_string(),
            });
        }

        let size_mb = file.size_mb();
        if size_mb > self.limits.max_single_mb {
            return Err(ValidationError::FileTooLarge {
                name: file.name().to_string(),
                size_mb,
                max_mb: self.limits.max_single_mb,
            });
        }

        Ok(())
    }

    /// Validate aggregate size (only when a total limit is configured)
    pub fn validate_total<F: MediaFile>(&self, files: &[F]) -> Result<(), ValidationError> {
        if self.limits.max_total_mb <= 0.0 {
            return Ok(());
        }

        let total_mb: f64 = files.iter().map(|f| f.size_mb()).sum();
        if total_mb > self.limits.max_total_mb {
            return Err(ValidationError::TotalTooLarge {
                total_mb,
                max_mb: self.limits.max_total_mb,
            });
        }
        Ok(())
    }
}
