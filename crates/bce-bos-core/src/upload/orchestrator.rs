//! Direct and multipart upload flows.
//!
//! A payload at or below the multipart threshold, or any single-pass stream,
//! is sent with one PUT. Anything larger goes through a session:
//!
//! 1. split `[0, size)` into parts (validated before any request is made)
//! 2. initiate the session
//! 3. upload the parts through a worker pool of `max_parallel` permits
//! 4. complete the session with the parts sorted by part number
//!
//! The first failing part fails the whole upload immediately. Parts already
//! in flight are left to finish on their own and no further parts start.
//! Nothing is retried, and the session is only aborted when
//! [`UploadConfig::abort_on_failure`] is set.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bce_bos_model::{CompletedPart, InitiateOptions, PutOptions, UploadPartInput};
use bytes::Bytes;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::partition::{UploadTask, split_tasks};
use super::progress::{ProgressSender, report};
use super::source::{DataSource, Inspected, RangeSource, read_stream};
use crate::config::UploadConfig;
use crate::error::{UploadError, ValidationError};
use crate::storage::StorageOps;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// ETag of the stored object.
    pub e_tag: String,
    /// Whether the multipart flow was used.
    pub multipart: bool,
    /// Number of parts uploaded; `0` for a direct upload.
    pub parts: u32,
    /// Session id of a multipart upload.
    pub upload_id: Option<String>,
}

/// State of one multipart session.
///
/// Only the orchestrating task mutates `completed`; part workers report back
/// over a channel.
#[derive(Debug, Clone)]
pub struct UploadSession {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Session id assigned by the service.
    pub upload_id: String,
    /// All parts, in part-number order.
    pub tasks: Vec<UploadTask>,
    /// Finished parts keyed by part number.
    pub completed: BTreeMap<u32, CompletedPart>,
}

impl UploadSession {
    /// Finished parts in ascending part-number order.
    #[must_use]
    pub fn ordered_parts(&self) -> Vec<CompletedPart> {
        self.completed.values().cloned().collect()
    }
}

/// Where part workers send their bytes.
struct PartTarget {
    bucket: String,
    key: String,
    upload_id: String,
}

/// Aborts the dispatcher when the orchestrator stops waiting for it.
struct DispatchGuard(JoinHandle<()>);

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

type PartResult = Result<CompletedPart, UploadError>;

/// Uploads payloads of any size through a [`StorageOps`] implementation.
pub struct Uploader<S: ?Sized> {
    storage: Arc<S>,
    config: UploadConfig,
}

impl<S: ?Sized> fmt::Debug for Uploader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uploader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: ?Sized> Clone for Uploader<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: self.config.clone(),
        }
    }
}

impl<S> Uploader<S>
where
    S: StorageOps + ?Sized + 'static,
{
    /// Create an uploader.
    pub fn new(storage: Arc<S>, config: UploadConfig) -> Self {
        Self { storage, config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Upload `source` to `bucket/key`.
    ///
    /// When `progress` is given, an [`UploadProgress`](super::UploadProgress)
    /// is sent after every completed part of a multipart upload.
    ///
    /// # Errors
    /// Returns the first error encountered; see [`UploadError`].
    pub async fn upload(
        &self,
        bucket: &str,
        key: &str,
        source: DataSource,
        progress: Option<ProgressSender>,
    ) -> Result<UploadOutcome, UploadError> {
        if bucket.is_empty() {
            return Err(ValidationError::EmptyBucket.into());
        }
        if key.trim_start_matches('/').is_empty() {
            return Err(ValidationError::EmptyKey.into());
        }

        match source.inspect().await? {
            Inspected::Stream {
                reader,
                content_length,
            } => {
                debug!(bucket, key, ?content_length, "Uploading stream in a single request");
                let body = read_stream(reader, content_length).await?;
                self.put_direct(bucket, key, body).await
            }
            Inspected::Sized { source, size } if size <= self.config.multipart_threshold => {
                debug!(bucket, key, size, "Uploading object in a single request");
                let body = source.read(0, size).await?;
                self.put_direct(bucket, key, body).await
            }
            Inspected::Sized { source, size } => {
                self.upload_multipart(bucket, key, source, size, progress.as_ref())
                    .await
            }
        }
    }

    async fn put_direct(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
    ) -> Result<UploadOutcome, UploadError> {
        let options = PutOptions {
            content_type: self.config.content_type.clone(),
            user_metadata: self.config.user_metadata.clone(),
        };
        let output = self
            .storage
            .put_direct(bucket, key, body, &options)
            .await
            .map_err(UploadError::Direct)?;

        Ok(UploadOutcome {
            e_tag: output.e_tag,
            multipart: false,
            parts: 0,
            upload_id: None,
        })
    }

    async fn upload_multipart(
        &self,
        bucket: &str,
        key: &str,
        source: RangeSource,
        size: u64,
        progress: Option<&ProgressSender>,
    ) -> Result<UploadOutcome, UploadError> {
        let tasks = split_tasks(size, self.config.part_size)?;
        if self.config.max_parallel == 0 {
            return Err(ValidationError::ZeroParallelism.into());
        }

        let options = InitiateOptions {
            content_type: self.config.content_type.clone(),
            user_metadata: self.config.user_metadata.clone(),
        };
        let initiated = self
            .storage
            .initiate_session(bucket, key, &options)
            .await
            .map_err(UploadError::InitiateSession)?;

        let mut session = UploadSession {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            upload_id: initiated.upload_id,
            tasks,
            completed: BTreeMap::new(),
        };
        info!(
            bucket,
            key,
            upload_id = %session.upload_id,
            size,
            parts = session.tasks.len(),
            max_parallel = self.config.max_parallel,
            "Starting multipart upload"
        );

        match self.run_session(&mut session, source, progress).await {
            Ok(e_tag) => {
                info!(upload_id = %session.upload_id, %e_tag, "Multipart upload complete");
                Ok(UploadOutcome {
                    e_tag,
                    multipart: true,
                    parts: u32::try_from(session.completed.len()).unwrap_or(u32::MAX),
                    upload_id: Some(session.upload_id),
                })
            }
            Err(err) => {
                if self.config.abort_on_failure {
                    self.abort(&session).await;
                } else {
                    warn!(
                        upload_id = %session.upload_id,
                        error = %err,
                        "Multipart upload failed; session left open"
                    );
                }
                Err(err)
            }
        }
    }

    async fn run_session(
        &self,
        session: &mut UploadSession,
        source: RangeSource,
        progress: Option<&ProgressSender>,
    ) -> Result<String, UploadError> {
        self.upload_parts(session, source, progress).await?;

        let output = self
            .storage
            .complete_session(
                &session.bucket,
                &session.key,
                &session.upload_id,
                session.ordered_parts(),
            )
            .await
            .map_err(UploadError::CompleteSession)?;
        Ok(output.e_tag)
    }

    /// Drive every part to completion, or return the first failure.
    async fn upload_parts(
        &self,
        session: &mut UploadSession,
        source: RangeSource,
        progress: Option<&ProgressSender>,
    ) -> Result<(), UploadError> {
        let total = session.tasks.len() as u64;
        let target = Arc::new(PartTarget {
            bucket: session.bucket.clone(),
            key: session.key.clone(),
            upload_id: session.upload_id.clone(),
        });
        let (results_tx, mut results) = mpsc::unbounded_channel();
        let _dispatcher = DispatchGuard(tokio::spawn(dispatch(
            Arc::clone(&self.storage),
            target,
            session.tasks.clone(),
            source,
            self.config.max_parallel.min(session.tasks.len()),
            results_tx,
        )));

        let mut loaded = 0;
        while loaded < total {
            let Some(result) = results.recv().await else {
                return Err(UploadError::Worker(format!(
                    "workers stopped after {loaded} of {total} parts"
                )));
            };

            let part = result?;
            let part_number = part.part_number;
            if session.completed.insert(part_number, part).is_some() {
                return Err(UploadError::Worker(format!(
                    "part {part_number} reported twice"
                )));
            }

            loaded += 1;
            debug!(upload_id = %session.upload_id, part_number, loaded, total, "Uploaded part");
            report(progress, loaded, total);
        }

        Ok(())
    }

    async fn abort(&self, session: &UploadSession) {
        match self
            .storage
            .abort_session(&session.bucket, &session.key, &session.upload_id)
            .await
        {
            Ok(()) => info!(upload_id = %session.upload_id, "Aborted failed multipart upload"),
            Err(e) => warn!(
                upload_id = %session.upload_id,
                error = %e,
                "Failed to abort multipart upload"
            ),
        }
    }
}

/// Start one worker per task, at most `max_parallel` at a time, in task order.
///
/// Permits are released as each part finishes, so the next queued part starts
/// as soon as any running part completes.
async fn dispatch<S>(
    storage: Arc<S>,
    target: Arc<PartTarget>,
    tasks: Vec<UploadTask>,
    source: RangeSource,
    max_parallel: usize,
    results: mpsc::UnboundedSender<PartResult>,
) where
    S: StorageOps + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_parallel));

    for task in tasks {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            return;
        };
        let storage = Arc::clone(&storage);
        let target = Arc::clone(&target);
        let source = source.clone();
        let results = results.clone();

        tokio::spawn(async move {
            let result = upload_part(storage.as_ref(), &target, &source, task).await;
            drop(permit);
            // The orchestrator stops listening after the first failure.
            let _ = results.send(result);
        });
    }
}

async fn upload_part<S>(
    storage: &S,
    target: &PartTarget,
    source: &RangeSource,
    task: UploadTask,
) -> PartResult
where
    S: StorageOps + ?Sized,
{
    let body = source.read(task.range_start, task.part_size).await?;
    let output = storage
        .upload_part(UploadPartInput {
            bucket: target.bucket.clone(),
            key: target.key.clone(),
            upload_id: target.upload_id.clone(),
            part_number: task.part_number,
            range_start: task.range_start,
            part_size: task.part_size,
            body,
        })
        .await
        .map_err(|source| UploadError::PartUpload {
            part_number: task.part_number,
            source,
        })?;

    Ok(CompletedPart {
        part_number: task.part_number,
        e_tag: output.e_tag,
    })
}

/// Upload `source` to `bucket/key` with `config`.
///
/// Shorthand for [`Uploader::new`] followed by [`Uploader::upload`].
///
/// # Errors
/// See [`Uploader::upload`].
pub async fn upload<S>(
    storage: Arc<S>,
    bucket: &str,
    key: &str,
    source: DataSource,
    config: UploadConfig,
    progress: Option<ProgressSender>,
) -> Result<UploadOutcome, UploadError>
where
    S: StorageOps + ?Sized + 'static,
{
    Uploader::new(storage, config)
        .upload(bucket, key, source, progress)
        .await
}
