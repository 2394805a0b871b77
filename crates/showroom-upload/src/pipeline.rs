//! End-to-end photo submission.
//!
//! guard (raw) -> compress -> guard (compressed) -> record -> presign ->
//! upload pool -> attach (presigned only) -> verify -> report

use std::sync::Arc;

use showroom_core::models::{
    CompressedFile, CreateCarRequest, ProgressCounters, SourceFile, UploadDestination, UploadTask,
    UploadedPhoto, VerificationResult,
};
use showroom_core::{AppError, ErrorMetadata, LogLevel, UploadConfig};
use showroom_processing::{compress_batch, BatchValidator, GuardStage, PassthroughFile};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::orchestrator::UploadOrchestrator;
use crate::presign::{NegotiationOutcome, PresignNegotiator};
use crate::progress::ProgressListener;
use crate::reporter::{Reporter, Summary};
use crate::traits::PhotoTransport;
use crate::verifier::UploadVerifier;

/// Which record the photos belong to
#[derive(Debug, Clone)]
pub enum SubmissionTarget {
    /// Create a new vehicle record first (creation forms)
    Create(CreateCarRequest),
    /// Attach to an existing record (edit form)
    Existing(String),
}

/// Outcome of a submission that got past validation and record creation
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub submission_id: Uuid,
    pub record_id: String,
    pub progress: ProgressCounters,
    pub verification: Option<VerificationResult>,
    pub summary: Summary,
    /// One entry per uploaded photo, in original selection order
    pub uploaded: Vec<UploadedPhoto>,
    /// Photos that were uploaded without re-encoding
    pub passthrough: Vec<PassthroughFile>,
    pub cancelled: bool,
}

impl SubmissionReport {
    /// First successfully uploaded photo in selection order
    pub fn primary_photo(&self) -> Option<&UploadedPhoto> {
        self.uploaded.first()
    }

    /// URL of the primary photo, `None` if the server did not report one for it
    pub fn primary_photo_url(&self) -> Option<&str> {
        self.primary_photo().and_then(|p| p.url.as_deref())
    }

    /// Known durable URLs, in selection order
    pub fn uploaded_urls(&self) -> Vec<String> {
        self.uploaded.iter().filter_map(|p| p.url.clone()).collect()
    }
}

pub struct SubmissionPipeline {
    transport: Arc<dyn PhotoTransport>,
    config: UploadConfig,
    validator: BatchValidator,
    negotiator: PresignNegotiator,
    orchestrator: UploadOrchestrator,
    verifier: UploadVerifier,
}

impl SubmissionPipeline {
    pub fn new(transport: Arc<dyn PhotoTransport>, config: UploadConfig) -> Self {
        Self {
            validator: BatchValidator::new(config.size_limits()),
            negotiator: PresignNegotiator::from_config(&config),
            orchestrator: UploadOrchestrator::from_config(&config),
            verifier: UploadVerifier::from_config(&config),
            transport,
            config,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Submit a batch of photos for a vehicle.
    ///
    /// Returns `Err` only for validation failures, record-creation failures, and
    /// cancellation before the record exists. Per-photo failures, presign
    /// degradation and verification mismatches are reported in the
    /// [`SubmissionReport`]. [`Reporter::summarize_error`] turns an `Err` into a
    /// user-facing summary.
    #[tracing::instrument(
        skip_all,
        fields(submission_id = tracing::field::Empty, file_count = files.len())
    )]
    pub async fn submit(
        &self,
        target: SubmissionTarget,
        files: Vec<SourceFile>,
        listener: &dyn ProgressListener,
        cancel: CancellationToken,
    ) -> Result<SubmissionReport, AppError> {
        let submission_id = Uuid::new_v4();
        tracing::Span::current().record("submission_id", tracing::field::display(submission_id));

        let result = self
            .run(submission_id, target, files, listener, &cancel)
            .await;
        if let Err(e) = &result {
            log_rejection(e);
        }
        result
    }

    async fn run(
        &self,
        submission_id: Uuid,
        target: SubmissionTarget,
        files: Vec<SourceFile>,
        listener: &dyn ProgressListener,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReport, AppError> {
        self.validator.validate(&files, GuardStage::PreCompression)?;

        // Dropping the batch stops new photos from being scheduled
        let compression = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            report = compress_batch(files, &self.config.compression, |progress| {
                listener.on_compression_progress(progress)
            }) => report,
        };

        self.validator
            .validate(&compression.files, GuardStage::PostCompression)?;

        let (record_id, baseline) = self.resolve_record(target, cancel).await?;
        let files = compression.files;
        let passthrough = compression.passthrough;

        if files.is_empty() {
            let progress = ProgressCounters::new(0);
            return Ok(SubmissionReport {
                submission_id,
                record_id,
                summary: Reporter::summarize(&progress, None),
                progress,
                verification: None,
                uploaded: Vec::new(),
                passthrough,
                cancelled: false,
            });
        }

        let negotiation = self
            .negotiator
            .negotiate(self.transport.as_ref(), &files, cancel)
            .await;
        if matches!(negotiation, NegotiationOutcome::Cancelled) {
            let progress = ProgressCounters::new(files.len());
            tracing::info!(record_id = %record_id, "Photo submission cancelled before upload");
            return Ok(SubmissionReport {
                submission_id,
                record_id,
                summary: Reporter::summarize(&progress, None),
                progress,
                verification: None,
                uploaded: Vec::new(),
                passthrough,
                cancelled: true,
            });
        }
        let presigned = negotiation.is_presigned();
        let tasks = build_tasks(files, negotiation, &record_id);

        let outcome = self
            .orchestrator
            .run(self.transport.as_ref(), tasks, listener, cancel)
            .await;
        let uploaded = outcome.uploaded_photos();

        if presigned && !uploaded.is_empty() {
            // Stored objects are linked even when the run was cancelled
            let urls: Vec<String> = uploaded.iter().filter_map(|p| p.url.clone()).collect();
            if let Err(e) = self.transport.attach_photos(&record_id, &urls).await {
                tracing::error!(
                    record_id = %record_id,
                    photo_count = urls.len(),
                    error_code = e.error_code(),
                    error = %e,
                    "Failed to attach uploaded photos to record"
                );
            }
        }

        let verification = if outcome.counters.success > 0 && !outcome.cancelled {
            Some(
                self.verifier
                    .verify(
                        self.transport.as_ref(),
                        &record_id,
                        baseline + outcome.counters.success,
                        cancel,
                    )
                    .await,
            )
        } else {
            None
        };

        let summary = Reporter::summarize(&outcome.counters, verification.as_ref());
        tracing::info!(
            record_id = %record_id,
            presigned,
            total = outcome.counters.total,
            success = outcome.counters.success,
            failed = outcome.counters.failed,
            verified = verification.map(|v| v.verified),
            level = ?summary.level,
            "Photo submission finished"
        );

        Ok(SubmissionReport {
            submission_id,
            record_id,
            progress: outcome.counters,
            verification,
            summary,
            uploaded,
            passthrough,
            cancelled: outcome.cancelled,
        })
    }

    /// Create or look up the parent record; returns its id and current photo count.
    async fn resolve_record(
        &self,
        target: SubmissionTarget,
        cancel: &CancellationToken,
    ) -> Result<(String, usize), AppError> {
        match target {
            SubmissionTarget::Create(request) => {
                let created = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(AppError::Cancelled),
                    created = self.transport.create_record(&request) => created,
                };
                let record = created.map_err(|e| {
                    tracing::error!(
                        error_code = e.error_code(),
                        error = %e,
                        "Vehicle record creation failed"
                    );
                    AppError::RecordCreation(e.to_string())
                })?;
                tracing::info!(record_id = %record.id, "Vehicle record created");
                Ok((record.id.clone(), record.photo_count()))
            }
            SubmissionTarget::Existing(record_id) => {
                let fetched = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(AppError::Cancelled),
                    fetched = self.transport.fetch_record(&record_id) => fetched,
                };
                match fetched {
                    Ok(record) => Ok((record_id, record.photo_count())),
                    Err(e) => {
                        tracing::warn!(
                            record_id = %record_id,
                            error = %e,
                            "Could not read existing photo count, verifying against uploads only"
                        );
                        Ok((record_id, 0))
                    }
                }
            }
        }
    }
}

/// Log a submission that ended without a report at the level its error asks for
fn log_rejection(error: &AppError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error_code = code, error = %error, "Photo submission rejected")
        }
        LogLevel::Warn => {
            tracing::warn!(error_code = code, error = %error, "Photo submission rejected")
        }
        LogLevel::Error => {
            tracing::error!(error_code = code, error = %error, "Photo submission rejected")
        }
    }
}

fn build_tasks(
    files: Vec<CompressedFile>,
    negotiation: NegotiationOutcome,
    record_id: &str,
) -> Vec<UploadTask> {
    match negotiation {
        NegotiationOutcome::Presigned(destinations) => files
            .into_iter()
            .zip(destinations)
            .enumerate()
            .map(|(index, (file, destination))| {
                UploadTask::new(index, file, UploadDestination::Presigned(destination))
            })
            .collect(),
        NegotiationOutcome::Fallback => files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                UploadTask::new(
                    index,
                    file,
                    UploadDestination::Fallback {
                        record_id: record_id.to_string(),
                    },
                )
            })
            .collect(),
        NegotiationOutcome::Cancelled => Vec::new(),
    }
}
