//! Upload session controller.
//!
//! Drives one upload through `idle -> selected -> uploading -> processing ->
//! {done | error | canceled}`. Renderers observe the machine through a
//! `watch` channel of [`UploadSnapshot`]s; the controller itself is shared
//! behind `Arc` and every operation takes `&self`.
//!
//! In-flight work is owned by a cancellation token per kind (transfer, poll).
//! Starting an operation cancels the previous token of its kind. A flow whose
//! token has been cancelled never writes the snapshot again; whoever cancelled
//! it (`cancel`, `reset`, a newer operation) owns the state from then on.

use crate::backend::UploadBackend;
use crate::failure::{Stage, UploadFailure};
use crate::polling::{Backoff, JOB_TIMEOUT, JOB_TIMEOUT_MINUTES};
use crate::progress;
use crate::state::{SelectedFile, UploadSnapshot, UploadState};
use clipforge_api_client::ProgressFn;
use clipforge_core::models::{
    Job, JobStatus, OutputSettings, Plan, PresignRequest, RegisterUploadRequest,
    ResolvedOutputSettings, UploadSession,
};
use clipforge_core::{ClientError, ClientResult, ErrorMetadata, LogLevel};
use clipforge_storage::RecordStore;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Holds the token of the single in-flight operation of one kind.
#[derive(Default)]
struct TokenSlot {
    current: Mutex<Option<(u64, CancellationToken)>>,
    next_id: AtomicU64,
}

impl TokenSlot {
    /// Install a fresh token, cancelling the previous one.
    fn begin(&self) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((id, token.clone()));
        if let Some((_, previous)) = previous {
            previous.cancel();
        }
        (id, token)
    }

    /// Release the slot if it still holds operation `id`.
    fn finish(&self, id: u64) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(current.as_ref(), Some((held, _)) if *held == id) {
            *current = None;
        }
    }

    fn cancel(&self) -> bool {
        let taken = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match taken {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Error tagged with the step it came from.
type StageError = (Stage, ClientError);

pub struct UploadSessionController {
    backend: Arc<dyn UploadBackend>,
    sessions: Arc<dyn RecordStore<UploadSession>>,
    state_tx: Arc<watch::Sender<UploadSnapshot>>,
    transfer: TokenSlot,
    poll: TokenSlot,
    /// Bumped by every `reset`, so a flow can tell a reset from a plain cancel.
    resets: AtomicU64,
}

impl UploadSessionController {
    pub fn new(
        backend: Arc<dyn UploadBackend>,
        sessions: Arc<dyn RecordStore<UploadSession>>,
    ) -> Self {
        let (state_tx, _) = watch::channel(UploadSnapshot::default());
        Self {
            backend,
            sessions,
            state_tx: Arc::new(state_tx),
            transfer: TokenSlot::default(),
            poll: TokenSlot::default(),
            resets: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Drop-target feedback. Only meaningful while idle or selected.
    pub fn set_dragging(&self, dragging: bool) {
        self.state_tx.send_if_modified(|snap| {
            let allowed = matches!(snap.state, UploadState::Idle | UploadState::Selected);
            if (allowed || !dragging) && snap.dragging != dragging {
                snap.dragging = dragging;
                true
            } else {
                false
            }
        });
    }

    /// Choose the file to upload. Discards any previous terminal result.
    pub async fn select_file(&self, path: impl AsRef<Path>) -> ClientResult<SelectedFile> {
        self.ensure_not_busy()?;
        let file = SelectedFile::inspect(path).await?;

        let mut refused = false;
        self.state_tx.send_modify(|snap| {
            if snap.state.is_busy() {
                refused = true;
                return;
            }
            *snap = UploadSnapshot {
                state: UploadState::Selected,
                file: Some(file.clone()),
                ..UploadSnapshot::default()
            };
        });
        if refused {
            return Err(busy_error());
        }

        tracing::info!(
            file_name = %file.name,
            size_bytes = file.size,
            content_type = %file.content_type,
            "File selected"
        );
        Ok(file)
    }

    /// Presign, PUT, register, then poll the job until it is done.
    ///
    /// Only starts from `idle` or `selected`; after a terminal state the caller
    /// must `reset` or select a file again. Refuses without a selected file or
    /// an aspect ratio; that check issues no network call and leaves the state
    /// untouched apart from `failure`.
    pub async fn start_upload(&self, settings: &OutputSettings, plan: &Plan) -> ClientResult<Job> {
        self.ensure_can_start()?;

        let selected = self.state_tx.borrow().file.clone();
        let file = match selected {
            Some(file) => file,
            None => {
                return Err(self.refuse(ClientError::Validation(
                    "Select a file before uploading".to_string(),
                )))
            }
        };
        let resolved = settings.resolve(plan).map_err(|e| self.refuse(e))?;

        // Claim the transfer slot under the watch lock so two starts cannot
        // both leave `selected`.
        let mut claimed = None;
        self.state_tx.send_if_modified(|snap| {
            if !can_start(snap.state) {
                return false;
            }
            claimed = Some((self.transfer.begin(), self.resets.load(Ordering::SeqCst)));
            snap.state = UploadState::Uploading;
            snap.progress = progress::STARTED;
            snap.dragging = false;
            snap.session = None;
            snap.job = None;
            snap.failure = None;
            true
        });
        let ((transfer_id, token), reset_generation) = claimed.ok_or_else(busy_error)?;
        tracing::info!(
            file_name = %file.name,
            size_bytes = file.size,
            aspect_ratio = %resolved.aspect_ratio,
            "Upload started"
        );

        let job_id = match self
            .upload_and_register(&file, &resolved, &token, reset_generation)
            .await
        {
            Ok(job_id) => job_id,
            Err((stage, err)) => {
                self.transfer.finish(transfer_id);
                return Err(self.fail(&token, stage, err));
            }
        };

        // Hand over to the poll slot before releasing the transfer slot so a
        // concurrent cancel always finds a token to cancel.
        let (poll_id, poll_token) = self.poll.begin();
        self.transfer.finish(transfer_id);
        if token.is_cancelled() {
            poll_token.cancel();
            self.poll.finish(poll_id);
            return Err(ClientError::Canceled);
        }
        self.poll_job(job_id, poll_id, poll_token).await
    }

    /// Pick up a persisted session and poll its job without re-uploading.
    /// Returns `Ok(None)` when nothing resumable is stored.
    pub async fn resume(&self) -> ClientResult<Option<Job>> {
        self.ensure_not_busy()?;

        let session = match self.sessions.load().await? {
            Some(session) => session,
            None => return Ok(None),
        };
        let job_id = match session.job_id {
            Some(job_id) if session.is_resumable() => job_id,
            _ => return Ok(None),
        };

        tracing::info!(
            job_id = job_id,
            upload_id = ?session.upload_id,
            file_name = ?session.file_name,
            "Resuming upload session"
        );
        let (poll_id, token) = self.poll.begin();
        self.update(&token, |snap| {
            *snap = UploadSnapshot {
                state: UploadState::Processing,
                progress: progress::REGISTERED,
                session: Some(session.clone()),
                ..UploadSnapshot::default()
            };
        });

        self.poll_job(job_id, poll_id, token).await.map(Some)
    }

    /// Abort whatever is in flight. The persisted session is kept so a later
    /// `resume` can pick the job up again.
    pub fn cancel(&self) {
        self.state_tx.send_if_modified(|snap| {
            let had_transfer = self.transfer.cancel();
            let had_poll = self.poll.cancel();
            if snap.state.is_busy() || had_transfer || had_poll {
                snap.state = UploadState::Canceled;
                snap.dragging = false;
                snap.failure = None;
                tracing::info!("Upload canceled");
                true
            } else {
                false
            }
        });
    }

    /// Abort in-flight work and forget everything, persisted session included.
    pub async fn reset(&self) -> ClientResult<()> {
        self.state_tx.send_modify(|snap| {
            self.resets.fetch_add(1, Ordering::SeqCst);
            self.transfer.cancel();
            self.poll.cancel();
            *snap = UploadSnapshot::default();
        });
        self.sessions.clear().await?;
        tracing::debug!("Upload session reset");
        Ok(())
    }

    async fn upload_and_register(
        &self,
        file: &SelectedFile,
        settings: &ResolvedOutputSettings,
        token: &CancellationToken,
        reset_generation: u64,
    ) -> Result<i64, StageError> {
        let presign_request = PresignRequest {
            filename: file.name.clone(),
            content_type: file.content_type.clone(),
            content_length: file.size,
        };
        let presign = cancellable(token, self.backend.presign(&presign_request))
            .await
            .map_err(|e| (Stage::Presign, e))?;
        self.update(token, |snap| snap.progress = progress::PRESIGNED);

        let on_progress = self.transfer_progress_fn(token);
        cancellable(
            token,
            self.backend
                .put_object(&presign, &file.path, file.size, on_progress, token),
        )
        .await
        .map_err(|e| (Stage::Transfer, e))?;
        self.update(token, |snap| {
            snap.progress = snap.progress.max(progress::TRANSFERRED)
        });

        let register_request = RegisterUploadRequest::new(&file.name, &presign.storage_key, settings);
        let registered = cancellable(token, self.backend.register_upload(&register_request))
            .await
            .map_err(|e| (Stage::Register, e))?;

        let session =
            UploadSession::from_registration(&registered, &presign.storage_key, &file.name);
        if self.reset_since(reset_generation) {
            return Err((Stage::Register, ClientError::Canceled));
        }
        // A plain cancel still persists the session so the job stays resumable.
        if let Err(e) = self.sessions.save(&session).await {
            tracing::warn!(
                job_id = registered.job_id,
                error = %e,
                "Failed to persist upload session; resume will not be possible"
            );
        }
        if self.reset_since(reset_generation) {
            // The reset's own clear may have run before this save landed.
            self.clear_session(registered.job_id).await;
            return Err((Stage::Register, ClientError::Canceled));
        }

        tracing::info!(
            upload_id = registered.upload_id,
            job_id = registered.job_id,
            status = %registered.status,
            "Upload registered"
        );
        self.update(token, |snap| {
            snap.state = UploadState::Processing;
            snap.progress = snap.progress.max(progress::REGISTERED);
            snap.session = Some(session);
        });

        Ok(registered.job_id)
    }

    fn transfer_progress_fn(&self, token: &CancellationToken) -> ProgressFn {
        let state_tx = Arc::clone(&self.state_tx);
        let token = token.clone();
        Arc::new(move |sent, total| {
            let mapped = progress::transfer_progress(sent, total);
            state_tx.send_if_modified(|snap| {
                if token.is_cancelled() || snap.state != UploadState::Uploading {
                    return false;
                }
                if mapped > snap.progress {
                    snap.progress = mapped;
                    true
                } else {
                    false
                }
            });
        })
    }

    async fn poll_job(
        &self,
        job_id: i64,
        poll_id: u64,
        token: CancellationToken,
    ) -> ClientResult<Job> {
        let result = self.poll_until_terminal(job_id, &token).await;
        self.poll.finish(poll_id);

        match result {
            Ok(job) => Ok(job),
            Err(err) => Err(self.fail(&token, Stage::Poll, err)),
        }
    }

    async fn poll_until_terminal(
        &self,
        job_id: i64,
        token: &CancellationToken,
    ) -> ClientResult<Job> {
        let started = Instant::now();
        let mut backoff = Backoff::default();
        let mut last_status: Option<JobStatus> = None;

        loop {
            let job = cancellable(token, self.backend.get_job(job_id)).await?;

            if let Some(previous) = last_status {
                if !previous.can_advance_to(job.status) {
                    tracing::warn!(
                        job_id = job_id,
                        from = %previous,
                        to = %job.status,
                        "Job status moved backwards"
                    );
                }
            }
            last_status = Some(job.status);
            tracing::debug!(job_id = job_id, status = %job.status, "Polled job");

            match job.status {
                JobStatus::Done => {
                    self.clear_session(job_id).await;
                    let mut applied = false;
                    self.update(token, |snap| {
                        snap.state = UploadState::Done;
                        snap.progress = progress::DONE;
                        snap.session = None;
                        snap.job = Some(job.clone());
                        applied = true;
                    });
                    if !applied {
                        return Err(ClientError::Canceled);
                    }
                    tracing::info!(job_id = job_id, upload_id = job.upload_id, "Job done");
                    return Ok(job);
                }
                JobStatus::Failed => {
                    self.clear_session(job_id).await;
                    let message = job.failure_message();
                    self.update(token, |snap| {
                        snap.session = None;
                        snap.job = Some(job);
                    });
                    return Err(ClientError::JobFailed { job_id, message });
                }
                JobStatus::Queued | JobStatus::Running => {
                    self.update(token, |snap| snap.job = Some(job));
                }
            }

            let delay = backoff.next_delay();
            cancellable(token, async {
                sleep(delay).await;
                Ok(())
            })
            .await?;

            if started.elapsed() >= JOB_TIMEOUT {
                return Err(ClientError::Timeout {
                    minutes: JOB_TIMEOUT_MINUTES,
                });
            }
        }
    }

    async fn clear_session(&self, job_id: i64) {
        if let Err(e) = self.sessions.clear().await {
            tracing::warn!(job_id = job_id, error = %e, "Failed to clear upload session");
        }
    }

    /// Move to `error` (or leave `canceled` alone) and hand the error back.
    fn fail(&self, token: &CancellationToken, stage: Stage, err: ClientError) -> ClientError {
        if err.is_canceled() || token.is_cancelled() {
            return ClientError::Canceled;
        }

        let failure = UploadFailure::classify(stage, &err);
        log_failure(&err, &failure);
        self.update(token, |snap| {
            snap.state = UploadState::Error;
            snap.failure = Some(failure);
        });
        err
    }

    /// Record a validation failure without changing state.
    fn refuse(&self, err: ClientError) -> ClientError {
        let failure = UploadFailure::classify(Stage::Validate, &err);
        tracing::debug!(reason = %failure.detail, "Upload refused");
        self.state_tx.send_modify(|snap| snap.failure = Some(failure));
        err
    }

    fn ensure_not_busy(&self) -> ClientResult<()> {
        if self.state_tx.borrow().state.is_busy() {
            return Err(busy_error());
        }
        Ok(())
    }

    fn ensure_can_start(&self) -> ClientResult<()> {
        let state = self.state_tx.borrow().state;
        if state.is_busy() {
            return Err(busy_error());
        }
        if !can_start(state) {
            return Err(ClientError::Validation(format!(
                "Last upload ended ({}); reset or select a file to start again",
                state
            )));
        }
        Ok(())
    }

    fn reset_since(&self, generation: u64) -> bool {
        self.resets.load(Ordering::SeqCst) != generation
    }

    /// Apply `f` unless `token` was cancelled. The check runs under the watch
    /// lock, so it cannot interleave with `cancel`.
    fn update(&self, token: &CancellationToken, f: impl FnOnce(&mut UploadSnapshot)) {
        self.state_tx.send_if_modified(|snap| {
            if token.is_cancelled() {
                return false;
            }
            f(snap);
            true
        });
    }
}

fn can_start(state: UploadState) -> bool {
    matches!(state, UploadState::Idle | UploadState::Selected)
}

fn busy_error() -> ClientError {
    ClientError::Validation("An upload is already in progress".to_string())
}

/// Race `fut` against `token`.
async fn cancellable<T>(
    token: &CancellationToken,
    fut: impl Future<Output = ClientResult<T>>,
) -> ClientResult<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ClientError::Canceled),
        result = fut => result,
    }
}

fn log_failure(err: &ClientError, failure: &UploadFailure) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(
            error_code = err.error_code(),
            title = %failure.title,
            detail = %failure.detail,
            "Upload failed"
        ),
        LogLevel::Warn => tracing::warn!(
            error_code = err.error_code(),
            title = %failure.title,
            detail = %failure.detail,
            "Upload failed"
        ),
        LogLevel::Error => tracing::error!(
            error_code = err.error_code(),
            title = %failure.title,
            detail = %failure.detail,
            error = %err,
            "Upload failed"
        ),
    }
}
