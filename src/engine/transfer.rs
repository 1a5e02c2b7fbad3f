//! Upload orchestration: single transfers and serialized batches.

use crate::common::errors::ClientError;
use crate::engine::flatten::FlattenedFile;
use crate::engine::progress::ProgressTracker;
use crate::remote::RemoteDrive;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Batch lifecycle. Transitions fire as each item settles; no state is
/// skipped and a finished batch never regresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running { completed: usize, total: usize },
    Completed { succeeded: usize, failed: usize },
}

/// Summary of one finished batch. `succeeded + failed == total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_names: Vec<String>,
}

impl BatchReport {
    /// A batch where nothing went through is a fatal failure for the caller;
    /// anything else completed, possibly partially.
    pub fn is_fatal(&self) -> bool {
        self.total > 0 && self.succeeded == 0
    }
}

fn leaf_name(relative_path: &str) -> &str {
    relative_path.rsplit('/').next().unwrap_or(relative_path)
}

/// Drives uploads against the remote service.
///
/// Batches run strictly one transfer at a time: that bounds socket and
/// memory usage and keeps cumulative progress monotonic. One item's failure
/// never aborts the rest of the batch.
pub struct TransferOrchestrator {
    remote: Arc<dyn RemoteDrive>,
    tracker: Arc<ProgressTracker>,
    settle_delay: Duration,
    state: BatchState,
}

impl TransferOrchestrator {
    pub fn new(remote: Arc<dyn RemoteDrive>, settle_delay: Duration) -> Self {
        Self {
            remote,
            tracker: Arc::new(ProgressTracker::new()),
            settle_delay,
            state: BatchState::Idle,
        }
    }

    /// Progress tracker for the operation currently (or last) running.
    pub fn tracker(&self) -> Arc<ProgressTracker> {
        self.tracker.clone()
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    /// Wait out the service's visibility window before the caller refreshes
    /// the current listing.
    pub async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }

    /// Upload one file into `target_id`, mapping byte progress to a
    /// percentage on the tracker. Returns the new item's transfer id.
    pub async fn upload_one(
        &mut self,
        file: &FlattenedFile,
        target_id: &str,
    ) -> Result<String, ClientError> {
        let name = leaf_name(&file.relative_path).to_string();
        self.tracker = Arc::new(ProgressTracker::new());
        self.tracker.init_files(vec![name.clone()], vec![file.size]);
        self.tracker.file_started(0);

        let tracker = self.tracker.clone();
        let on_progress = move |sent: u64, _total: u64| tracker.record_bytes(0, sent);

        let result = self
            .remote
            .upload(&file.payload, &name, file.size, target_id, &on_progress)
            .await;

        match &result {
            Ok(fid) => {
                self.tracker.file_done(0);
                tracing::info!("uploaded '{name}' as {fid}");
            }
            Err(err) => {
                self.tracker.file_failed(0, err.to_string());
                tracing::warn!("upload of '{name}' failed: {err}");
            }
        }
        result
    }

    /// Upload a flattened plan into `target_id`, one file at a time.
    ///
    /// Counters are reset at entry so a fresh report always describes this
    /// batch alone. Files whose `relative_path` carries directory components
    /// get their remote container chain created first, memoized per batch.
    pub async fn upload_batch(
        &mut self,
        files: &[FlattenedFile],
        target_id: &str,
    ) -> BatchReport {
        let total = files.len();
        self.tracker = Arc::new(ProgressTracker::new());
        self.tracker.init_files(
            files.iter().map(|f| f.relative_path.clone()).collect(),
            files.iter().map(|f| f.size).collect(),
        );
        self.state = BatchState::Running {
            completed: 0,
            total,
        };

        let mut failed_names = Vec::new();
        let mut container_cache: HashMap<String, String> = HashMap::new();

        for (index, file) in files.iter().enumerate() {
            let outcome = self
                .transfer_item(index, file, target_id, &mut container_cache)
                .await;

            if let Err(err) = outcome {
                self.tracker.file_failed(index, err.to_string());
                failed_names.push(file.relative_path.clone());
                tracing::warn!("batch item '{}' failed: {err}", file.relative_path);
            }

            self.state = BatchState::Running {
                completed: index + 1,
                total,
            };
        }

        let succeeded = self.tracker.succeeded();
        let failed = self.tracker.failed();
        self.state = BatchState::Completed { succeeded, failed };

        BatchReport {
            total,
            succeeded,
            failed,
            failed_names,
        }
    }

    async fn transfer_item(
        &self,
        index: usize,
        file: &FlattenedFile,
        target_id: &str,
        container_cache: &mut HashMap<String, String>,
    ) -> Result<(), ClientError> {
        let target = self
            .ensure_container_path(&file.relative_path, target_id, container_cache)
            .await?;

        self.tracker.file_started(index);
        let tracker = self.tracker.clone();
        let on_progress = move |sent: u64, _total: u64| tracker.record_bytes(index, sent);

        self.remote
            .upload(
                &file.payload,
                leaf_name(&file.relative_path),
                file.size,
                &target,
                &on_progress,
            )
            .await?;

        self.tracker.file_done(index);
        Ok(())
    }

    /// Create (or look up) the remote container chain for the directory part
    /// of `relative_path`, returning the id the file itself belongs in.
    async fn ensure_container_path(
        &self,
        relative_path: &str,
        root_id: &str,
        cache: &mut HashMap<String, String>,
    ) -> Result<String, ClientError> {
        let Some((dir_path, _)) = relative_path.rsplit_once('/') else {
            return Ok(root_id.to_string());
        };

        let mut parent_id = root_id.to_string();
        let mut prefix = String::new();
        for part in dir_path.split('/') {
            if prefix.is_empty() {
                prefix = part.to_string();
            } else {
                prefix = format!("{prefix}/{part}");
            }

            if let Some(id) = cache.get(&prefix) {
                parent_id = id.clone();
                continue;
            }

            let id = self.remote.create_container(part, &parent_id).await?;
            cache.insert(prefix.clone(), id.clone());
            parent_id = id;
        }
        Ok(parent_id)
    }
}
