//! Presigned upload negotiation.
//!
//! One request describes the whole batch. Any failure (transport error, non-2xx,
//! malformed or mismatched response) degrades the entire batch to the multipart
//! fallback; modes are never mixed within a submission.

use std::time::Duration;

use showroom_core::models::{CompressedFile, PresignFileSpec, PresignedDestination};
use showroom_core::{AppError, UploadConfig};
use showroom_infra::{with_retry, RetryError, RetryPolicy};
use tokio_util::sync::CancellationToken;

use crate::traits::PhotoTransport;

/// Upload mode chosen for a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// One destination per file, in file order
    Presigned(Vec<PresignedDestination>),
    Fallback,
    /// The submission was aborted while negotiating
    Cancelled,
}

impl NegotiationOutcome {
    pub fn is_presigned(&self) -> bool {
        matches!(self, NegotiationOutcome::Presigned(_))
    }
}

#[derive(Debug, Clone)]
pub struct PresignNegotiator {
    policy: RetryPolicy,
}

impl PresignNegotiator {
    /// `attempts` is the total number of negotiation requests before degrading
    pub fn new(attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            policy: RetryPolicy {
                max_retries: attempts.saturating_sub(1),
                base_delay: Duration::from_millis(250),
                max_jitter: Duration::ZERO,
                attempt_timeout: Some(attempt_timeout),
                ..RetryPolicy::default()
            },
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.presign_attempts, config.attempt_timeout())
    }

    pub async fn negotiate(
        &self,
        transport: &dyn PhotoTransport,
        files: &[CompressedFile],
        cancel: &CancellationToken,
    ) -> NegotiationOutcome {
        if files.is_empty() {
            return NegotiationOutcome::Presigned(Vec::new());
        }

        let specs: Vec<PresignFileSpec> = files.iter().map(PresignFileSpec::from).collect();

        let result = with_retry(&self.policy, cancel, |_| request(transport, &specs)).await;

        match result {
            Ok(retried) => {
                tracing::debug!(
                    file_count = files.len(),
                    attempts = retried.attempts,
                    "Presigned uploads negotiated"
                );
                NegotiationOutcome::Presigned(retried.value)
            }
            Err(RetryError::Cancelled { attempts }) => {
                tracing::debug!(attempts, "Presign negotiation cancelled");
                NegotiationOutcome::Cancelled
            }
            Err(e) => {
                tracing::warn!(
                    file_count = files.len(),
                    error = %e,
                    "Presign negotiation failed, falling back to multipart uploads"
                );
                NegotiationOutcome::Fallback
            }
        }
    }
}

async fn request(
    transport: &dyn PhotoTransport,
    specs: &[PresignFileSpec],
) -> Result<Vec<PresignedDestination>, AppError> {
    let destinations = transport.presign(specs).await?;
    check_response(specs, &destinations)?;
    Ok(destinations)
}

fn check_response(
    specs: &[PresignFileSpec],
    destinations: &[PresignedDestination],
) -> Result<(), AppError> {
    if destinations.len() != specs.len() {
        return Err(AppError::Negotiation(format!(
            "expected {} destinations, got {}",
            specs.len(),
            destinations.len()
        )));
    }

    if let Some(position) = destinations
        .iter()
        .position(|d| d.upload_url.trim().is_empty() || d.public_url.trim().is_empty())
    {
        return Err(AppError::Negotiation(format!(
            "destination for {} is missing a URL",
            specs[position].name
        )));
    }

    Ok(())
}
