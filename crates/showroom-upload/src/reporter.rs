//! Turns upload counters and verification into one user-facing status.

use serde::Serialize;
use showroom_core::models::{ProgressCounters, VerificationResult};
use showroom_core::{AppError, ErrorMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    Success,
    Partial,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub level: ReportLevel,
    pub message: String,
}

pub struct Reporter;

impl Reporter {
    /// Summarize a run.
    ///
    /// A run with no photos is a success. A run where every photo landed is a
    /// success even if verification lagged; the mismatch only softens the message.
    /// Runs cut short by cancellation are partial unless nothing succeeded.
    pub fn summarize(
        progress: &ProgressCounters,
        verification: Option<&VerificationResult>,
    ) -> Summary {
        if progress.total == 0 {
            return Summary {
                level: ReportLevel::Success,
                message: "Vehicle saved without photos.".to_string(),
            };
        }

        if progress.failed == 0 && progress.success == progress.total {
            let mut message = format!("All {} uploaded.", photos(progress.total));
            match verification {
                Some(v) if v.verified => {
                    message.push_str(&format!(" {} verified on the server.", v.observed_count));
                }
                Some(v) => {
                    message.push_str(&format!(
                        " The server shows {} of {} so far; they may take a moment to appear.",
                        v.observed_count, v.expected_count
                    ));
                }
                None => {}
            }
            return Summary {
                level: ReportLevel::Success,
                message,
            };
        }

        if progress.success == 0 {
            return Summary {
                level: ReportLevel::Failure,
                message: "Photo upload failed. The vehicle was saved; please add the photos again later by editing it."
                    .to_string(),
            };
        }

        let mut message = format!(
            "{} uploaded, {} failed.",
            photos(progress.success),
            progress.failed
        );
        let unsettled = progress.total - progress.completed.min(progress.total);
        if unsettled > 0 {
            message.push_str(&format!(" {} not uploaded (cancelled).", photos(unsettled)));
        }
        message.push_str(" You can retry the missing photos by editing the vehicle.");

        Summary {
            level: ReportLevel::Partial,
            message,
        }
    }

    /// Summary for a submission that ended before any upload report existed
    pub fn summarize_error(error: &AppError) -> Summary {
        Summary {
            level: ReportLevel::Failure,
            message: error.client_message(),
        }
    }
}

fn photos(count: usize) -> String {
    if count == 1 {
        "1 photo".to_string()
    } else {
        format!("{} photos", count)
    }
}
