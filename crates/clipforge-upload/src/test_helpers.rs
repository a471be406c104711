//! Scripted upload backend for controller tests.

use crate::backend::UploadBackend;
use async_trait::async_trait;
use clipforge_api_client::ProgressFn;
use clipforge_core::models::{
    Job, JobStatus, PresignRequest, PresignResponse, RegisterUploadRequest,
    RegisterUploadResponse, UploadSession,
};
use clipforge_core::{ClientError, ClientResult};
use clipforge_storage::{MemoryStore, RecordStore, StorageResult};
use std::collections::{BTreeMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub enum Call {
    Presign { request: PresignRequest },
    Put { put_url: String, content_length: u64 },
    Register { request: RegisterUploadRequest },
    GetJob { job_id: i64, at: Instant },
}

pub enum PutMode {
    Succeed,
    Fail(ClientError),
    HangUntilCancelled,
}

pub fn job(id: i64, upload_id: i64, status: JobStatus, error: Option<&str>) -> Job {
    Job {
        id,
        upload_id,
        status,
        error: error.map(String::from),
        created_at: None,
        updated_at: None,
    }
}

pub fn presign_ok() -> PresignResponse {
    PresignResponse {
        put_url: "https://bucket.example.com/u/abc.mp4?X-Amz-Signature=sig".to_string(),
        storage_key: "u/abc.mp4".to_string(),
        required_headers: BTreeMap::from([("Content-Type".to_string(), "video/mp4".to_string())]),
    }
}

/// Write a file of `len` bytes named `name` into a fresh temp dir.
pub fn sample_file(name: &str, len: usize) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&vec![0u8; len]).unwrap();
    (dir, path)
}

pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    presign_error: Mutex<Option<ClientError>>,
    put_mode: Mutex<PutMode>,
    put_started: Notify,
    register_error: Mutex<Option<ClientError>>,
    register_response: RegisterUploadResponse,
    /// Served in order; the last one repeats once the queue is drained.
    jobs: Mutex<VecDeque<Job>>,
    last_job: Mutex<Option<Job>>,
    session_observer: Mutex<Option<MemoryStore<UploadSession>>>,
    sessions_at_poll: Mutex<Vec<Option<UploadSession>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            presign_error: Mutex::new(None),
            put_mode: Mutex::new(PutMode::Succeed),
            put_started: Notify::new(),
            register_error: Mutex::new(None),
            register_response: RegisterUploadResponse {
                upload_id: 42,
                job_id: 77,
                status: JobStatus::Queued,
            },
            jobs: Mutex::new(VecDeque::new()),
            last_job: Mutex::new(None),
            session_observer: Mutex::new(None),
            sessions_at_poll: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn push_job(&self, job: Job) {
        lock(&self.jobs).push_back(job);
    }

    pub fn set_put_mode(&self, mode: PutMode) {
        *lock(&self.put_mode) = mode;
    }

    pub fn fail_presign(&self, err: ClientError) {
        *lock(&self.presign_error) = Some(err);
    }

    pub fn fail_register(&self, err: ClientError) {
        *lock(&self.register_error) = Some(err);
    }

    /// Record the persisted session each time a job is fetched.
    pub fn observe_sessions(&self, store: MemoryStore<UploadSession>) {
        *lock(&self.session_observer) = Some(store);
    }

    pub fn sessions_seen_at_poll(&self) -> Vec<Option<UploadSession>> {
        lock(&self.sessions_at_poll).clone()
    }

    /// Resolves once a PUT has begun.
    pub async fn put_started(&self) {
        self.put_started.notified().await;
    }
}

#[async_trait]
impl UploadBackend for FakeBackend {
    async fn presign(&self, request: &PresignRequest) -> ClientResult<PresignResponse> {
        lock(&self.calls).push(Call::Presign {
            request: request.clone(),
        });
        match lock(&self.presign_error).take() {
            Some(err) => Err(err),
            None => Ok(presign_ok()),
        }
    }

    async fn put_object(
        &self,
        presign: &PresignResponse,
        _path: &Path,
        content_length: u64,
        on_progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        lock(&self.calls).push(Call::Put {
            put_url: presign.put_url.clone(),
            content_length,
        });
        self.put_started.notify_one();

        let hang = {
            let mut mode = lock(&self.put_mode);
            match std::mem::replace(&mut *mode, PutMode::Succeed) {
                PutMode::Succeed => false,
                PutMode::Fail(err) => return Err(err),
                PutMode::HangUntilCancelled => {
                    *mode = PutMode::HangUntilCancelled;
                    true
                }
            }
        };
        if hang {
            on_progress(content_length / 2, content_length);
            cancel.cancelled().await;
            return Err(ClientError::Canceled);
        }

        on_progress(content_length / 4, content_length);
        on_progress(content_length / 2, content_length);
        on_progress(content_length, content_length);
        Ok(())
    }

    async fn register_upload(
        &self,
        request: &RegisterUploadRequest,
    ) -> ClientResult<RegisterUploadResponse> {
        lock(&self.calls).push(Call::Register {
            request: request.clone(),
        });
        match lock(&self.register_error).take() {
            Some(err) => Err(err),
            None => Ok(self.register_response.clone()),
        }
    }

    async fn get_job(&self, job_id: i64) -> ClientResult<Job> {
        lock(&self.calls).push(Call::GetJob {
            job_id,
            at: Instant::now(),
        });
        let observed = lock(&self.session_observer)
            .as_ref()
            .map(|store| store.snapshot());
        if let Some(session) = observed {
            lock(&self.sessions_at_poll).push(session);
        }

        let next = lock(&self.jobs).pop_front();
        let mut last = lock(&self.last_job);
        if let Some(job) = next {
            *last = Some(job);
        }
        last.clone()
            .ok_or_else(|| ClientError::Http {
                status: 404,
                message: "Job not found".to_string(),
                body: String::new(),
            })
    }
}

/// Session store whose writes take a while, for racing `reset` and `cancel`
/// against persistence.
pub struct SlowStore {
    inner: MemoryStore<UploadSession>,
    save_delay: Duration,
    clear_delay: Duration,
    save_started: Notify,
    clear_started: Notify,
}

impl SlowStore {
    pub fn new(save_delay: Duration, clear_delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            save_delay,
            clear_delay,
            save_started: Notify::new(),
            clear_started: Notify::new(),
        }
    }

    pub fn snapshot(&self) -> Option<UploadSession> {
        self.inner.snapshot()
    }

    pub async fn save_started(&self) {
        self.save_started.notified().await;
    }

    pub async fn clear_started(&self) {
        self.clear_started.notified().await;
    }
}

#[async_trait]
impl RecordStore<UploadSession> for SlowStore {
    async fn load(&self) -> StorageResult<Option<UploadSession>> {
        self.inner.load().await
    }

    async fn save(&self, record: &UploadSession) -> StorageResult<()> {
        self.save_started.notify_one();
        sleep(self.save_delay).await;
        self.inner.save(record).await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.clear_started.notify_one();
        sleep(self.clear_delay).await;
        self.inner.clear().await
    }

    fn backend_name(&self) -> &'static str {
        "slow-memory"
    }
}
