//! Showroom Upload
//!
//! Resilient bulk photo upload for vehicle records: presign negotiation with a
//! multipart fallback, a bounded-concurrency retrying upload pool, post-upload
//! verification, and a single count-based summary for the user.

pub mod orchestrator;
pub mod pipeline;
pub mod presign;
pub mod progress;
pub mod reporter;
pub mod traits;
pub mod transport;
pub mod verifier;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::{OrchestratorOutcome, UploadOrchestrator};
pub use pipeline::{SubmissionPipeline, SubmissionReport, SubmissionTarget};
pub use presign::{NegotiationOutcome, PresignNegotiator};
pub use progress::{progress_channel, NoopListener, ProgressListener, WatchListener};
pub use reporter::{ReportLevel, Reporter, Summary};
pub use traits::PhotoTransport;
pub use verifier::UploadVerifier;
