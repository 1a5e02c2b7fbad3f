//! Lock-free transfer progress tracking.
//!
//! One tracker per batch (or single transfer). File metadata is set once via
//! `init_files()`; upload callbacks store byte counts through atomics and
//! display layers call `snapshot()` whenever they want current state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

/// Status of one transfer task. Monotonic: a task never leaves a terminal
/// state and never skips `Uploading` once the transport was invoked.
#[derive(Clone, Debug, PartialEq)]
pub enum FileStatus {
    Pending,
    Uploading(f64),
    Done,
    Failed(String),
}

/// Progress information for a single file.
#[derive(Clone, Debug)]
pub struct FileProgress {
    pub name: String,
    /// Expected byte total, as measured locally when the plan was built.
    pub size: u64,
    pub status: FileStatus,
}

/// Aggregate progress snapshot for presentation consumers.
#[derive(Clone, Debug, Default)]
pub struct TransferProgress {
    pub files: Vec<FileProgress>,
    /// Settled items, successful or not.
    pub completed: usize,
    pub total: usize,
}

impl TransferProgress {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }

    /// Cumulative batch progress in percent: settled items over total.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed as f64 / self.total as f64) * 100.0
    }
}

struct FileState {
    names: Vec<String>,
    total_bytes: Vec<u64>,
    sent_bytes: Vec<AtomicU64>,
    started: Vec<AtomicBool>,
    done: Vec<AtomicBool>,
    errors: Mutex<Vec<(usize, String)>>,
}

pub struct ProgressTracker {
    file_state: OnceLock<FileState>,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            file_state: OnceLock::new(),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Initialize per-file names and expected byte totals.
    /// Must be called before any of the per-file update methods.
    pub fn init_files(&self, names: Vec<String>, byte_totals: Vec<u64>) {
        let count = names.len();
        let sent_bytes = (0..count).map(|_| AtomicU64::new(0)).collect();
        let started = (0..count).map(|_| AtomicBool::new(false)).collect();
        let done = (0..count).map(|_| AtomicBool::new(false)).collect();
        let _ = self.file_state.set(FileState {
            names,
            total_bytes: byte_totals,
            sent_bytes,
            started,
            done,
            errors: Mutex::new(Vec::new()),
        });
    }

    /// Mark the transport as invoked for a file, moving it out of `Pending`
    /// even before the first byte callback arrives.
    pub fn file_started(&self, index: usize) {
        if let Some(fs) = self.file_state.get() {
            if index < fs.started.len() {
                fs.started[index].store(true, Ordering::Relaxed);
            }
        }
    }

    /// Record cumulative bytes sent for a file.
    pub fn record_bytes(&self, index: usize, sent: u64) {
        if let Some(fs) = self.file_state.get() {
            if index < fs.sent_bytes.len() {
                fs.sent_bytes[index].store(sent, Ordering::Relaxed);
            }
        }
    }

    /// Mark one file fully transferred.
    /// Idempotent; repeated calls for the same index are no-ops.
    pub fn file_done(&self, index: usize) {
        if let Some(fs) = self.file_state.get() {
            if index < fs.done.len() && !fs.done[index].swap(true, Ordering::AcqRel) {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                fs.sent_bytes[index].store(fs.total_bytes[index], Ordering::Relaxed);
            }
        }
    }

    /// Mark one file failed with its error message.
    pub fn file_failed(&self, index: usize, error: String) {
        if let Some(fs) = self.file_state.get() {
            if index < fs.names.len() {
                let mut errors = fs.errors.lock().unwrap();
                if !errors.iter().any(|(i, _)| *i == index) {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    errors.push((index, error));
                }
            }
        }
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::Relaxed) as usize
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed) as usize
    }

    /// Build a snapshot for display.
    pub fn snapshot(&self) -> TransferProgress {
        let Some(fs) = self.file_state.get() else {
            return TransferProgress::default();
        };

        let errors = fs.errors.lock().unwrap();
        let files = fs
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let status = if let Some((_, err)) = errors.iter().find(|(idx, _)| *idx == i) {
                    FileStatus::Failed(err.clone())
                } else if fs.done[i].load(Ordering::Relaxed) {
                    FileStatus::Done
                } else if fs.started[i].load(Ordering::Relaxed) {
                    let sent = fs.sent_bytes[i].load(Ordering::Relaxed);
                    let total = fs.total_bytes[i].max(1);
                    FileStatus::Uploading((sent as f64 / total as f64) * 100.0)
                } else {
                    FileStatus::Pending
                };
                FileProgress {
                    name: name.clone(),
                    size: fs.total_bytes[i],
                    status,
                }
            })
            .collect();

        TransferProgress {
            files,
            completed: self.succeeded() + self.failed(),
            total: fs.names.len(),
        }
    }
}
