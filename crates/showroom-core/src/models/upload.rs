use serde::{Deserialize, Serialize};

use super::media::CompressedFile;

/// One entry of a presign negotiation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignFileSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

impl From<&CompressedFile> for PresignFileSpec {
    fn from(file: &CompressedFile) -> Self {
        Self {
            name: file.name.clone(),
            content_type: file.content_type.clone(),
        }
    }
}

/// Single-use, time-limited upload destination issued by the storage backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedDestination {
    /// URL the file bytes are PUT to
    pub upload_url: String,
    /// Durable URL of the object once the PUT succeeds
    #[serde(rename = "url")]
    pub public_url: String,
    pub content_type: String,
}

/// Where a single task uploads its file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadDestination {
    Presigned(PresignedDestination),
    /// Multipart POST to the record's photo endpoint
    Fallback { record_id: String },
}

impl UploadDestination {
    pub fn is_presigned(&self) -> bool {
        matches!(self, UploadDestination::Presigned(_))
    }
}

/// Lifecycle of an upload task
///
/// `Pending -> InFlight -> {Succeeded | Failed}`; a failed attempt goes back to
/// `InFlight` while retries remain. `Succeeded` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// One file driven through upload by the orchestrator
#[derive(Debug, Clone)]
pub struct UploadTask {
    /// Position in the original user selection; determines photo order
    pub index: usize,
    pub file: CompressedFile,
    pub destination: UploadDestination,
    /// Number of attempts made so far
    pub attempt: u32,
    pub state: TaskState,
    /// Durable URL, known once the task has succeeded
    pub public_url: Option<String>,
    pub last_error: Option<String>,
}

impl UploadTask {
    pub fn new(index: usize, file: CompressedFile, destination: UploadDestination) -> Self {
        Self {
            index,
            file,
            destination,
            attempt: 0,
            state: TaskState::Pending,
            public_url: None,
            last_error: None,
        }
    }
}

/// A photo that reached the server, one per succeeded task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPhoto {
    /// Position in the original user selection
    pub index: usize,
    pub name: String,
    /// `None` when the server accepted the photo without echoing its URL
    pub url: Option<String>,
}

impl UploadedPhoto {
    /// `None` unless `task` succeeded
    pub fn from_task(task: &UploadTask) -> Option<Self> {
        (task.state == TaskState::Succeeded).then(|| Self {
            index: task.index,
            name: task.file.name.clone(),
            url: task.public_url.clone(),
        })
    }
}

/// Live counters of an upload run
///
/// Invariant: `success + failed == completed <= total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressCounters {
    pub total: usize,
    pub completed: usize,
    pub success: usize,
    pub failed: usize,
    pub in_flight: usize,
}

impl ProgressCounters {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// True once every task has reached a terminal state
    pub fn is_settled(&self) -> bool {
        self.completed == self.total
    }

    pub fn is_consistent(&self) -> bool {
        self.success + self.failed == self.completed && self.completed <= self.total
    }

    /// Progress line shown while uploading
    pub fn message(&self) -> String {
        format!(
            "Uploading {}/{} photos... {} ok / {} failed",
            self.completed, self.total, self.success, self.failed
        )
    }
}

/// Outcome of the post-upload verification pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub expected_count: usize,
    pub observed_count: usize,
    pub verified: bool,
    pub attempts_used: u32,
}
