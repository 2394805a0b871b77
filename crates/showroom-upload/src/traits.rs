use async_trait::async_trait;
use showroom_core::models::{
    CarRecord, CompressedFile, CreateCarRequest, PresignFileSpec, PresignedDestination,
};
use showroom_core::AppError;

/// Network seam of the upload pipeline.
///
/// Implemented for [`showroom_api_client::ApiClient`]; tests substitute in-memory
/// fakes. Every method is a suspension point and must be cancel-safe: dropping
/// the returned future aborts the underlying request.
#[async_trait]
pub trait PhotoTransport: Send + Sync {
    /// Create the parent vehicle record
    async fn create_record(&self, request: &CreateCarRequest) -> Result<CarRecord, AppError>;

    /// Fetch the canonical record, including its persisted photo list
    async fn fetch_record(&self, record_id: &str) -> Result<CarRecord, AppError>;

    /// Request one presigned destination per file, in the same order
    async fn presign(
        &self,
        files: &[PresignFileSpec],
    ) -> Result<Vec<PresignedDestination>, AppError>;

    /// PUT the file bytes to a presigned destination
    async fn put_presigned(
        &self,
        destination: &PresignedDestination,
        file: &CompressedFile,
    ) -> Result<(), AppError>;

    /// Multipart POST of one file to the record's photo endpoint.
    ///
    /// Returns the stored photo URL when the server reports one.
    async fn post_fallback(
        &self,
        record_id: &str,
        file: &CompressedFile,
    ) -> Result<Option<String>, AppError>;

    /// Link presigned uploads to the record, in display order
    async fn attach_photos(&self, record_id: &str, urls: &[String]) -> Result<(), AppError>;
}
