//! Scripted in-memory transport for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use showroom_core::models::{
    CarRecord, CompressedFile, CreateCarRequest, PresignFileSpec, PresignedDestination,
    UploadDestination, UploadTask,
};
use showroom_core::AppError;

use crate::traits::PhotoTransport;

pub fn compressed(name: &str) -> CompressedFile {
    CompressedFile {
        name: format!("{}.webp", name),
        content_type: "image/webp".to_string(),
        data: bytes_for(name),
        width: 800,
        height: 600,
        passthrough: false,
    }
}

fn bytes_for(name: &str) -> bytes::Bytes {
    bytes::Bytes::from(name.as_bytes().to_vec())
}

pub fn presigned_tasks(names: &[&str]) -> Vec<UploadTask> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let file = compressed(name);
            let destination = PresignedDestination {
                upload_url: format!("https://bucket.test/put/{}", file.name),
                public_url: format!("https://cdn.test/{}", file.name),
                content_type: file.content_type.clone(),
            };
            UploadTask::new(index, file, UploadDestination::Presigned(destination))
        })
        .collect()
}

pub fn fallback_tasks(record_id: &str, names: &[&str]) -> Vec<UploadTask> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            UploadTask::new(
                index,
                compressed(name),
                UploadDestination::Fallback {
                    record_id: record_id.to_string(),
                },
            )
        })
        .collect()
}

pub fn record(id: &str, photos: usize) -> CarRecord {
    CarRecord {
        id: id.to_string(),
        photos: (0..photos)
            .map(|i| format!("https://cdn.test/{}/{}.webp", id, i))
            .collect(),
        created_at: None,
        attributes: Default::default(),
    }
}

#[derive(Default)]
struct State {
    /// Remaining injected failures per file name; `u32::MAX` never runs out
    failures: HashMap<String, u32>,
    file_delays: HashMap<String, Duration>,
    /// Fallback uploads that succeed without echoing a URL
    urlless: HashSet<String>,
    upload_calls: HashMap<String, u32>,
    completion_order: Vec<String>,
    fallback_calls: usize,
    presign_calls: usize,
    /// Scripted presign responses, consumed front to back
    presign_script: VecDeque<Result<Vec<PresignedDestination>, AppError>>,
    /// Scripted photo counts returned by successive fetches
    fetch_script: VecDeque<Result<usize, AppError>>,
    fetch_calls: usize,
}

/// Transport whose behaviour is scripted per file name
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
    upload_delay: Duration,
    fetch_delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn with_file_delay(self, name: &str, delay: Duration) -> Self {
        self.state
            .lock()
            .unwrap()
            .file_delays
            .insert(name.to_string(), delay);
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn omit_fallback_url(self, name: &str) -> Self {
        self.state.lock().unwrap().urlless.insert(name.to_string());
        self
    }

    pub fn fail_times(self, name: &str, times: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(name.to_string(), times);
        self
    }

    pub fn fail_always(self, name: &str) -> Self {
        self.fail_times(name, u32::MAX)
    }

    pub fn script_presign(self, response: Result<Vec<PresignedDestination>, AppError>) -> Self {
        self.state.lock().unwrap().presign_script.push_back(response);
        self
    }

    pub fn script_fetch(self, response: Result<usize, AppError>) -> Self {
        self.state.lock().unwrap().fetch_script.push_back(response);
        self
    }

    pub fn upload_calls(&self, name: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .upload_calls
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_upload_calls(&self) -> u32 {
        self.state.lock().unwrap().upload_calls.values().sum()
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.state.lock().unwrap().completion_order.clone()
    }

    pub fn fallback_calls(&self) -> usize {
        self.state.lock().unwrap().fallback_calls
    }

    pub fn presign_calls(&self) -> usize {
        self.state.lock().unwrap().presign_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn current_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    async fn upload(&self, file: &CompressedFile) -> Result<(), AppError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(self.in_flight.clone());
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = {
            let mut state = self.state.lock().unwrap();
            *state.upload_calls.entry(file.name.clone()).or_insert(0) += 1;
            state
                .file_delays
                .get(&file.name)
                .copied()
                .unwrap_or(self.upload_delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.failures.get_mut(&file.name) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(AppError::transport(Some(500), "injected failure"));
            }
        }
        state.completion_order.push(file.name.clone());
        Ok(())
    }
}

#[async_trait]
impl PhotoTransport for MockTransport {
    async fn create_record(&self, _request: &CreateCarRequest) -> Result<CarRecord, AppError> {
        Ok(record("car-1", 0))
    }

    async fn fetch_record(&self, record_id: &str) -> Result<CarRecord, AppError> {
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        let next = {
            let mut state = self.state.lock().unwrap();
            state.fetch_calls += 1;
            state.fetch_script.pop_front()
        };
        match next {
            Some(Ok(count)) => Ok(record(record_id, count)),
            Some(Err(e)) => Err(e),
            None => Ok(record(record_id, 0)),
        }
    }

    async fn presign(
        &self,
        files: &[PresignFileSpec],
    ) -> Result<Vec<PresignedDestination>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.presign_calls += 1;
        match state.presign_script.pop_front() {
            Some(scripted) => scripted,
            None => Ok(files
                .iter()
                .map(|f| PresignedDestination {
                    upload_url: format!("https://bucket.test/put/{}", f.name),
                    public_url: format!("https://cdn.test/{}", f.name),
                    content_type: f.content_type.clone(),
                })
                .collect()),
        }
    }

    async fn put_presigned(
        &self,
        _destination: &PresignedDestination,
        file: &CompressedFile,
    ) -> Result<(), AppError> {
        self.upload(file).await
    }

    async fn post_fallback(
        &self,
        record_id: &str,
        file: &CompressedFile,
    ) -> Result<Option<String>, AppError> {
        self.state.lock().unwrap().fallback_calls += 1;
        self.upload(file).await?;
        if self.state.lock().unwrap().urlless.contains(&file.name) {
            return Ok(None);
        }
        Ok(Some(format!("https://cdn.test/{}/{}", record_id, file.name)))
    }

    async fn attach_photos(&self, _record_id: &str, _urls: &[String]) -> Result<(), AppError> {
        Ok(())
    }
}
