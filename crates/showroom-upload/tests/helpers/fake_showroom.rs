//! In-memory stand-in for the showroom API and its object store.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use showroom_core::models::{
    CarRecord, CompressedFile, CreateCarRequest, PresignFileSpec, PresignedDestination,
};
use showroom_core::AppError;
use showroom_upload::PhotoTransport;
use tokio_util::sync::CancellationToken;

const CDN: &str = "https://cdn.showroom.test";
const BUCKET: &str = "https://bucket.showroom.test";

#[derive(Default)]
struct Server {
    next_id: u64,
    /// Persisted photo URLs per record, in display order
    records: HashMap<String, Vec<String>>,
    /// Objects stored through presigned PUTs, keyed by public URL
    objects: HashMap<String, Bytes>,
    /// Remaining injected failures per file name; `u32::MAX` never runs out
    failures: HashMap<String, u32>,
    delays: HashMap<String, Duration>,
    /// Multipart uploads accepted with an empty response body
    urlless: HashSet<String>,
    create_delay: Option<Duration>,
    /// Cancel this token as soon as record creation starts
    cancel_on_create: Option<CancellationToken>,
    /// Caps on the photo count seen by successive record fetches
    visibility: VecDeque<usize>,
    presign_status: Option<u16>,
    create_status: Option<u16>,
    /// Cancel this token once the given number of uploads are in flight
    cancel_at: Option<(usize, CancellationToken)>,
    log: Vec<String>,
}

/// Fake showroom backend
#[derive(Clone, Default)]
pub struct FakeShowroom {
    server: Arc<Mutex<Server>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeShowroom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, id: &str, photos: usize) -> Self {
        let urls = (0..photos)
            .map(|i| format!("{}/{}/existing-{}.webp", CDN, id, i))
            .collect();
        self.server
            .lock()
            .unwrap()
            .records
            .insert(id.to_string(), urls);
        self
    }

    /// Fail every upload of `name` this many times before accepting it
    pub fn fail_upload(self, name: &str, times: u32) -> Self {
        self.server
            .lock()
            .unwrap()
            .failures
            .insert(name.to_string(), times);
        self
    }

    pub fn reject_upload(self, name: &str) -> Self {
        self.fail_upload(name, u32::MAX)
    }

    pub fn delay_upload(self, name: &str, delay: Duration) -> Self {
        self.server
            .lock()
            .unwrap()
            .delays
            .insert(name.to_string(), delay);
        self
    }

    pub fn omit_fallback_url(self, name: &str) -> Self {
        self.server
            .lock()
            .unwrap()
            .urlless
            .insert(name.to_string());
        self
    }

    pub fn delay_create(self, delay: Duration) -> Self {
        self.server.lock().unwrap().create_delay = Some(delay);
        self
    }

    pub fn cancel_on_create(self, token: CancellationToken) -> Self {
        self.server.lock().unwrap().cancel_on_create = Some(token);
        self
    }

    pub fn fail_presign(self, status: u16) -> Self {
        self.server.lock().unwrap().presign_status = Some(status);
        self
    }

    pub fn fail_create(self, status: u16) -> Self {
        self.server.lock().unwrap().create_status = Some(status);
        self
    }

    /// Successive fetches see at most these many photos, then the real count
    pub fn lag_visibility(self, counts: &[usize]) -> Self {
        self.server.lock().unwrap().visibility = counts.iter().copied().collect();
        self
    }

    pub fn cancel_when_in_flight(self, in_flight: usize, token: CancellationToken) -> Self {
        self.server.lock().unwrap().cancel_at = Some((in_flight, token));
        self
    }

    pub fn photos(&self, record_id: &str) -> Vec<String> {
        self.server
            .lock()
            .unwrap()
            .records
            .get(record_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn object(&self, public_url: &str) -> Option<Bytes> {
        self.server.lock().unwrap().objects.get(public_url).cloned()
    }

    pub fn log(&self) -> Vec<String> {
        self.server.lock().unwrap().log.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log().iter().filter(|l| l.starts_with(prefix)).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Simulate one upload request; `Ok` once the bytes are accepted
    async fn receive(&self, kind: &str, file: &CompressedFile) -> Result<(), AppError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(self.in_flight.clone());
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = {
            let mut server = self.server.lock().unwrap();
            server.log.push(format!("{} {}", kind, file.name));
            if let Some((threshold, token)) = &server.cancel_at {
                if current >= *threshold {
                    token.cancel();
                }
            }
            server.delays.get(&file.name).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut server = self.server.lock().unwrap();
        if let Some(remaining) = server.failures.get_mut(&file.name) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(AppError::transport(Some(503), "storage unavailable"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PhotoTransport for FakeShowroom {
    async fn create_record(&self, _request: &CreateCarRequest) -> Result<CarRecord, AppError> {
        let delay = {
            let mut server = self.server.lock().unwrap();
            server.log.push("create".to_string());
            if let Some(token) = &server.cancel_on_create {
                token.cancel();
            }
            server.create_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut server = self.server.lock().unwrap();
        if let Some(status) = server.create_status {
            return Err(AppError::transport(Some(status), "invalid vehicle"));
        }

        server.next_id += 1;
        let id = format!("car-{}", server.next_id);
        server.records.insert(id.clone(), Vec::new());
        Ok(CarRecord {
            id,
            photos: Vec::new(),
            created_at: None,
            attributes: Default::default(),
        })
    }

    async fn fetch_record(&self, record_id: &str) -> Result<CarRecord, AppError> {
        let mut server = self.server.lock().unwrap();
        server.log.push(format!("get {}", record_id));
        let mut photos = server
            .records
            .get(record_id)
            .cloned()
            .ok_or_else(|| AppError::transport(Some(404), "record not found"))?;
        if let Some(cap) = server.visibility.pop_front() {
            photos.truncate(cap);
        }
        Ok(CarRecord {
            id: record_id.to_string(),
            photos,
            created_at: None,
            attributes: Default::default(),
        })
    }

    async fn presign(
        &self,
        files: &[PresignFileSpec],
    ) -> Result<Vec<PresignedDestination>, AppError> {
        let mut server = self.server.lock().unwrap();
        server.log.push("presign".to_string());
        if let Some(status) = server.presign_status {
            return Err(AppError::transport(Some(status), "presign unavailable"));
        }
        Ok(files
            .iter()
            .map(|f| PresignedDestination {
                upload_url: format!("{}/{}?signature=test", BUCKET, f.name),
                public_url: format!("{}/{}", CDN, f.name),
                content_type: f.content_type.clone(),
            })
            .collect())
    }

    async fn put_presigned(
        &self,
        destination: &PresignedDestination,
        file: &CompressedFile,
    ) -> Result<(), AppError> {
        self.receive("put", file).await?;
        self.server
            .lock()
            .unwrap()
            .objects
            .insert(destination.public_url.clone(), file.data.clone());
        Ok(())
    }

    async fn post_fallback(
        &self,
        record_id: &str,
        file: &CompressedFile,
    ) -> Result<Option<String>, AppError> {
        self.receive("post", file).await?;
        let url = format!("{}/{}/{}", CDN, record_id, file.name);
        let mut server = self.server.lock().unwrap();
        server.objects.insert(url.clone(), file.data.clone());
        server
            .records
            .entry(record_id.to_string())
            .or_default()
            .push(url.clone());
        if server.urlless.contains(&file.name) {
            return Ok(None);
        }
        Ok(Some(url))
    }

    async fn attach_photos(&self, record_id: &str, urls: &[String]) -> Result<(), AppError> {
        let mut server = self.server.lock().unwrap();
        server.log.push(format!("attach {}", urls.len()));
        if let Some(missing) = urls.iter().find(|u| !server.objects.contains_key(*u)) {
            return Err(AppError::transport(
                Some(422),
                format!("unknown object {}", missing),
            ));
        }
        server
            .records
            .entry(record_id.to_string())
            .or_default()
            .extend(urls.iter().cloned());
        Ok(())
    }
}
