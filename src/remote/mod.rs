//! Remote drive interface: the operations the engine needs from the service,
//! plus the wire shapes it consumes.

pub mod http;

use crate::common::errors::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use http::HttpDrive;

/// Id of the root container in the remote hierarchy.
pub const ROOT_LOCATION_ID: &str = "0";

/// One row of a container listing as the service reports it.
///
/// `fid` and `id` are distinct identifiers for the same stored item: `fid`
/// addresses it in transfer/link operations, `id` in enumeration and
/// deletion. Both are opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub fid: String,
    pub id: String,
    pub name: String,
    pub is_container: bool,
    #[serde(default)]
    pub size_display: String,
    /// 14-digit `YYYYMMDDHHMMSS`, or empty.
    #[serde(default)]
    pub create_time_digits: String,
}

/// Result of a successful connect: where the session starts and what is
/// already visible there.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInfo {
    pub current_location_id: String,
    pub current_path: String,
    #[serde(default)]
    pub files: Vec<DriveItem>,
}

/// A user-checked reference into the currently displayed listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionItem {
    pub fid: String,
    pub id: String,
    pub name: String,
}

/// Outcome of one aggregate-links call. Per-item failure handling happens on
/// the service side; the client only renders this.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub total_files: u32,
    pub success_count: u32,
    #[serde(default)]
    pub failed_files: Vec<String>,
    #[serde(default)]
    pub combined_artifact: String,
}

/// Byte-level upload progress callback: `(bytes_sent, bytes_total)`.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Operations the engine requires from the drive service.
///
/// One method per remote operation, no retries at this layer. Implementations
/// map transport-level failures to [`ClientError::Transport`], undecodable
/// bodies to [`ClientError::ResponseParse`], and well-formed rejections to
/// [`ClientError::Remote`].
#[async_trait]
pub trait RemoteDrive: Send + Sync {
    /// Validate the token and return the initial location plus its listing.
    async fn connect(&self, token: &str) -> Result<ConnectInfo, ClientError>;

    /// List the children of a container.
    async fn list(&self, location_id: &str) -> Result<Vec<DriveItem>, ClientError>;

    /// Upload one local file into a container, reporting byte progress.
    /// Returns the new item's transfer id.
    async fn upload(
        &self,
        payload: &Path,
        name: &str,
        size: u64,
        target_id: &str,
        progress: ProgressFn<'_>,
    ) -> Result<String, ClientError>;

    /// Delete a file or container by its enumeration id.
    async fn delete(&self, item_id: &str, is_container: bool) -> Result<(), ClientError>;

    /// Create a container and return its id.
    async fn create_container(&self, name: &str, parent_id: &str) -> Result<String, ClientError>;

    /// Resolve a direct download URL for one file.
    async fn direct_link(&self, fid: &str) -> Result<String, ClientError>;

    /// Issue one aggregate call for the whole selection.
    async fn aggregate_links(
        &self,
        items: &[SelectionItem],
        target_path: &str,
    ) -> Result<AggregateResult, ClientError>;
}
