//! Domain methods for the showroom API client.
//!
//! Request and record types come from `showroom_core::models`; the response
//! wrappers that only exist on the wire are defined here.

use crate::{api_prefix, ApiClient};
use anyhow::{Context, Result};
use bytes::Bytes;
use showroom_core::constants::{CARS_PATH, PHOTO_FORM_FIELD, PRESIGN_PATH};
use showroom_core::models::{CarRecord, CreateCarRequest, PresignFileSpec, PresignedDestination};

/// Presign endpoint response. Deployments answer with either a bare array or an
/// `{"uploads": [...]}` envelope.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PresignResponse {
    List(Vec<PresignedDestination>),
    Wrapped { uploads: Vec<PresignedDestination> },
}

impl PresignResponse {
    pub fn into_destinations(self) -> Vec<PresignedDestination> {
        match self {
            PresignResponse::List(list) | PresignResponse::Wrapped { uploads: list } => list,
        }
    }
}

/// Body returned by the multipart photo endpoint, when it returns one.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PhotoUploadResponse {
    #[serde(default, alias = "publicUrl")]
    pub url: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct AttachPhotosRequest<'a> {
    urls: &'a [String],
}

fn car_path(id: &str) -> String {
    format!("{}{}/{}", api_prefix(), CARS_PATH, urlencoding::encode(id))
}

impl ApiClient {
    /// Create a vehicle record. POST {prefix}/cars
    pub async fn create_car(&self, request: &CreateCarRequest) -> Result<CarRecord> {
        self.post_json(&format!("{}{}", api_prefix(), CARS_PATH), request)
            .await
            .context("Failed to create vehicle record")
    }

    /// Fetch a vehicle record, including its persisted photo list.
    pub async fn get_car(&self, id: &str) -> Result<CarRecord> {
        self.get(&car_path(id), &[])
            .await
            .with_context(|| format!("Failed to fetch vehicle record {}", id))
    }

    /// Ask the storage backend for one presigned destination per file, in order.
    pub async fn presign(&self, files: &[PresignFileSpec]) -> Result<Vec<PresignedDestination>> {
        let response: PresignResponse = self
            .post_json(&format!("{}{}", api_prefix(), PRESIGN_PATH), files)
            .await
            .context("Failed to negotiate presigned uploads")?;

        Ok(response.into_destinations())
    }

    /// PUT file bytes to a presigned URL.
    ///
    /// The URL carries its own credentials, so no auth header is sent.
    pub async fn put_presigned(&self, destination: &PresignedDestination, data: Bytes) -> Result<()> {
        let response = self
            .client()
            .put(&destination.upload_url)
            .header(reqwest::header::CONTENT_TYPE, destination.content_type.as_str())
            .body(data)
            .send()
            .await
            .context("Failed to send presigned upload")?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    /// Upload one photo as multipart form data to the record's photo endpoint.
    ///
    /// Returns the stored photo's URL when the server reports it.
    pub async fn upload_photo(
        &self,
        record_id: &str,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<Option<String>> {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .with_context(|| format!("Invalid content type: {}", content_type))?;
        let form = reqwest::multipart::Form::new().part(PHOTO_FORM_FIELD, part);

        let response: Option<PhotoUploadResponse> = self
            .post_multipart(&format!("{}/photos", car_path(record_id)), form)
            .await
            .with_context(|| format!("Failed to upload photo {}", file_name))?;

        Ok(response.and_then(|r| r.url))
    }

    /// Register already-stored photo URLs on a record, in display order.
    pub async fn attach_photos(&self, record_id: &str, urls: &[String]) -> Result<()> {
        let url = self.build_url(&format!("{}/photos", car_path(record_id)));
        self.send(self.client().post(&url).json(&AttachPhotosRequest { urls }))
            .await
            .with_context(|| format!("Failed to attach photos to record {}", record_id))?;
        Ok(())
    }
}
