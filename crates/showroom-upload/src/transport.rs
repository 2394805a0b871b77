//! [`PhotoTransport`] over the showroom HTTP API.

use async_trait::async_trait;
use showroom_api_client::{status_of, ApiClient};
use showroom_core::models::{
    CarRecord, CompressedFile, CreateCarRequest, PresignFileSpec, PresignedDestination,
};
use showroom_core::AppError;

use crate::traits::PhotoTransport;

fn transport_error(error: anyhow::Error) -> AppError {
    AppError::transport(status_of(&error), format!("{:#}", error))
}

#[async_trait]
impl PhotoTransport for ApiClient {
    async fn create_record(&self, request: &CreateCarRequest) -> Result<CarRecord, AppError> {
        self.create_car(request).await.map_err(transport_error)
    }

    async fn fetch_record(&self, record_id: &str) -> Result<CarRecord, AppError> {
        self.get_car(record_id).await.map_err(transport_error)
    }

    async fn presign(
        &self,
        files: &[PresignFileSpec],
    ) -> Result<Vec<PresignedDestination>, AppError> {
        ApiClient::presign(self, files).await.map_err(transport_error)
    }

    async fn put_presigned(
        &self,
        destination: &PresignedDestination,
        file: &CompressedFile,
    ) -> Result<(), AppError> {
        ApiClient::put_presigned(self, destination, file.data.clone())
            .await
            .map_err(transport_error)
    }

    async fn post_fallback(
        &self,
        record_id: &str,
        file: &CompressedFile,
    ) -> Result<Option<String>, AppError> {
        self.upload_photo(record_id, &file.name, &file.content_type, file.data.clone())
            .await
            .map_err(transport_error)
    }

    async fn attach_photos(&self, record_id: &str, urls: &[String]) -> Result<(), AppError> {
        ApiClient::attach_photos(self, record_id, urls)
            .await
            .map_err(transport_error)
    }
}
