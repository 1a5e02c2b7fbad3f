//! Shared test doubles: a scripted in-memory drive and a scripted
//! child-enumeration source.

#![allow(dead_code)]

use async_trait::async_trait;
use pandrive::common::errors::ClientError;
use pandrive::engine::flatten::{ChildLister, PendingEntry};
use pandrive::remote::{
    AggregateResult, ConnectInfo, DriveItem, ProgressFn, RemoteDrive, SelectionItem,
    ROOT_LOCATION_ID,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Build a listing row the way the service reports one.
pub fn item(name: &str, is_container: bool) -> DriveItem {
    DriveItem {
        fid: format!("f-{name}"),
        id: format!("i-{name}"),
        name: name.to_string(),
        is_container,
        size_display: if is_container {
            "-".to_string()
        } else {
            "1.0 KB".to_string()
        },
        create_time_digits: "20240115093000".to_string(),
    }
}

/// Scripted in-memory drive. Listings are keyed by location id; individual
/// operations can be forced to fail by name.
#[derive(Default)]
pub struct MockDrive {
    pub listings: Mutex<HashMap<String, Vec<DriveItem>>>,
    /// Upload fails for any file whose leaf name is in this set.
    pub fail_uploads: Mutex<HashSet<String>>,
    /// When set, `list` fails with a transport error.
    pub fail_list: AtomicBool,
    /// When set, `connect` is rejected.
    pub reject_connect: AtomicBool,
    pub aggregate_response: Mutex<Option<AggregateResult>>,

    pub list_calls: AtomicUsize,
    pub aggregate_calls: AtomicUsize,
    pub uploads: Mutex<Vec<(String, String)>>, // (name, target_id)
    pub created: Mutex<Vec<(String, String)>>, // (name, parent_id)
    pub deleted: Mutex<Vec<(String, bool)>>,
    next_id: AtomicUsize,
}

impl MockDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(items: Vec<DriveItem>) -> Self {
        let drive = Self::new();
        drive
            .listings
            .lock()
            .unwrap()
            .insert(ROOT_LOCATION_ID.to_string(), items);
        drive
    }

    pub fn set_listing(&self, location_id: &str, items: Vec<DriveItem>) {
        self.listings
            .lock()
            .unwrap()
            .insert(location_id.to_string(), items);
    }

    pub fn fail_upload_of(&self, name: &str) {
        self.fail_uploads.lock().unwrap().insert(name.to_string());
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteDrive for MockDrive {
    async fn connect(&self, _token: &str) -> Result<ConnectInfo, ClientError> {
        if self.reject_connect.load(Ordering::SeqCst) {
            return Err(ClientError::Connection("token rejected".to_string()));
        }
        let files = self
            .listings
            .lock()
            .unwrap()
            .get(ROOT_LOCATION_ID)
            .cloned()
            .unwrap_or_default();
        Ok(ConnectInfo {
            current_location_id: ROOT_LOCATION_ID.to_string(),
            current_path: "/".to_string(),
            files,
        })
    }

    async fn list(&self, location_id: &str) -> Result<Vec<DriveItem>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("connection reset".to_string()));
        }
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(location_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upload(
        &self,
        _payload: &Path,
        name: &str,
        size: u64,
        target_id: &str,
        progress: ProgressFn<'_>,
    ) -> Result<String, ClientError> {
        progress(size / 2, size.max(1));

        if self.fail_uploads.lock().unwrap().contains(name) {
            return Err(ClientError::Remote(format!("upload of '{name}' rejected")));
        }

        progress(size, size.max(1));
        self.uploads
            .lock()
            .unwrap()
            .push((name.to_string(), target_id.to_string()));
        Ok(format!("f-{name}"))
    }

    async fn delete(&self, item_id: &str, is_container: bool) -> Result<(), ClientError> {
        self.deleted
            .lock()
            .unwrap()
            .push((item_id.to_string(), is_container));
        Ok(())
    }

    async fn create_container(&self, name: &str, parent_id: &str) -> Result<String, ClientError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.created
            .lock()
            .unwrap()
            .push((name.to_string(), parent_id.to_string()));
        Ok(format!("c{n}"))
    }

    async fn direct_link(&self, fid: &str) -> Result<String, ClientError> {
        Ok(format!("https://cdn.test/{fid}"))
    }

    async fn aggregate_links(
        &self,
        items: &[SelectionItem],
        _target_path: &str,
    ) -> Result<AggregateResult, ClientError> {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.aggregate_response.lock().unwrap().clone() {
            return Ok(scripted);
        }
        Ok(AggregateResult {
            total_files: items.len() as u32,
            success_count: items.len() as u32,
            failed_files: Vec::new(),
            combined_artifact: items
                .iter()
                .map(|i| format!("https://cdn.test/{}", i.fid))
                .collect::<Vec<_>>()
                .join("\n"),
        })
    }
}

/// Scripted enumeration source for flattening tests. Containers are keyed by
/// their handle path; handles in `fail` refuse to enumerate.
#[derive(Default)]
pub struct MockLister {
    pub children: HashMap<PathBuf, Vec<PendingEntry>>,
    pub fail: HashSet<PathBuf>,
}

impl MockLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(&mut self, handle: &str, entries: Vec<PendingEntry>) {
        self.children.insert(PathBuf::from(handle), entries);
    }

    pub fn fail_on(&mut self, handle: &str) {
        self.fail.insert(PathBuf::from(handle));
    }
}

#[async_trait]
impl ChildLister for MockLister {
    async fn list_children(&self, handle: &Path) -> anyhow::Result<Vec<PendingEntry>> {
        if self.fail.contains(handle) {
            anyhow::bail!("enumeration refused for {}", handle.display());
        }
        Ok(self.children.get(handle).cloned().unwrap_or_default())
    }
}

/// Leaf entry helper for flattening tests; payload handles need not exist.
pub fn file_entry(name: &str, size: u64) -> PendingEntry {
    PendingEntry::File {
        name: name.to_string(),
        payload: PathBuf::from(format!("/fake/{name}")),
        size,
    }
}

pub fn container_entry(name: &str, handle: &str) -> PendingEntry {
    PendingEntry::Container {
        name: name.to_string(),
        handle: PathBuf::from(handle),
    }
}
