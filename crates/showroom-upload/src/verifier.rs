//! Post-upload reconciliation against the server's persisted photo list.

use std::time::Duration;

use showroom_core::models::VerificationResult;
use showroom_core::UploadConfig;
use tokio_util::sync::CancellationToken;

use crate::traits::PhotoTransport;

const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Polls the canonical record until its photo count matches the expectation.
///
/// The wait before poll `n + 1` is `backoff * n`. A mismatch, a failed fetch or a
/// poll that outlives `poll_timeout` is never fatal; the last observed count is
/// reported. Cancellation interrupts both the wait and an outstanding fetch.
#[derive(Debug, Clone)]
pub struct UploadVerifier {
    max_attempts: u32,
    backoff: Duration,
    poll_timeout: Duration,
}

impl UploadVerifier {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.verify_attempts, config.verify_backoff())
            .with_poll_timeout(config.attempt_timeout())
    }

    pub async fn verify(
        &self,
        transport: &dyn PhotoTransport,
        record_id: &str,
        expected_count: usize,
        cancel: &CancellationToken,
    ) -> VerificationResult {
        let mut observed_count = 0;
        let mut attempts_used = 0;
        let mut cancelled = false;

        for attempt in 1..=self.max_attempts {
            attempts_used = attempt;

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                fetched = tokio::time::timeout(
                    self.poll_timeout,
                    transport.fetch_record(record_id),
                ) => fetched,
            };

            match fetched {
                Ok(Ok(record)) => {
                    observed_count = record.photo_count();
                    if observed_count == expected_count {
                        tracing::debug!(
                            record_id,
                            expected_count,
                            attempts = attempt,
                            "Photo count verified"
                        );
                        return VerificationResult {
                            expected_count,
                            observed_count,
                            verified: true,
                            attempts_used,
                        };
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(record_id, attempt, error = %e, "Verification fetch failed");
                }
                Err(_) => {
                    tracing::warn!(
                        record_id,
                        attempt,
                        timeout_ms = self.poll_timeout.as_millis() as u64,
                        "Verification fetch timed out"
                    );
                }
            }

            if attempt == self.max_attempts {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                _ = tokio::time::sleep(self.backoff * attempt) => {}
            }
        }

        if cancelled {
            tracing::debug!(
                record_id,
                observed_count,
                attempts = attempts_used,
                "Verification cancelled"
            );
        } else {
            tracing::warn!(
                record_id,
                expected_count,
                observed_count,
                attempts = attempts_used,
                "Photo count mismatch after verification"
            );
        }

        VerificationResult {
            expected_count,
            observed_count,
            verified: false,
            attempts_used,
        }
    }
}
